// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Atomic count backing counters.

use std::sync::atomic::{AtomicI64, Ordering};

/// A signed, atomically updated count.
#[derive(Debug, Default)]
pub struct CounterStat {
    count: AtomicI64,
}

impl CounterStat {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` (which may be negative) to the count.
    pub fn add(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// Subtracts `n` from the count. Wraps on overflow like [`CounterStat::add`].
    pub fn sub(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    /// Returns the current count.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_add() {
        let counter = CounterStat::new();
        counter.add(5);
        counter.add(-2);
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_counter_sub_extremes_do_not_panic() {
        let counter = CounterStat::new();
        counter.sub(i64::MIN);
        assert_eq!(counter.count(), i64::MIN);
        counter.sub(4);
        assert_eq!(counter.count(), i64::MAX - 3);
    }

    #[test]
    fn test_counter_concurrent_adds() {
        let counter = Arc::new(CounterStat::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.add(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 4000);
    }
}

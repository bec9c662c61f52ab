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

//! Value distributions backed by a bounded reservoir.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tally_core::telemetry::Snapshot;

/// Holds the values a histogram snapshot is computed from.
#[derive(Debug)]
pub enum Reservoir {
    /// Keeps the last `size` values.
    SlidingWindow {
        /// Maximum number of values kept.
        size: usize,
        /// The retained values, oldest first.
        values: VecDeque<i64>,
    },
    /// Keeps the values recorded during the last `window`.
    SlidingTimeWindow {
        /// How long values are retained.
        window: Duration,
        /// The retained values with their recording time, oldest first.
        values: VecDeque<(Instant, i64)>,
    },
}

impl Reservoir {
    /// A reservoir keeping the last `size` values. A size of zero keeps one.
    pub fn sliding_window(size: usize) -> Self {
        let size = size.max(1);
        Reservoir::SlidingWindow {
            size,
            values: VecDeque::with_capacity(size),
        }
    }

    /// A reservoir keeping the values recorded during the last `window`.
    pub fn sliding_time_window(window: Duration) -> Self {
        Reservoir::SlidingTimeWindow {
            window,
            values: VecDeque::new(),
        }
    }

    fn update(&mut self, value: i64) {
        match self {
            Reservoir::SlidingWindow { size, values } => {
                if values.len() == *size {
                    values.pop_front();
                }
                values.push_back(value);
            }
            Reservoir::SlidingTimeWindow { window, values } => {
                let now = Instant::now();
                values.push_back((now, value));
                Self::evict(*window, values, now);
            }
        }
    }

    fn snapshot(&mut self) -> Snapshot {
        match self {
            Reservoir::SlidingWindow { values, .. } => Snapshot::new(values.iter().copied().collect()),
            Reservoir::SlidingTimeWindow { window, values } => {
                Self::evict(*window, values, Instant::now());
                Snapshot::new(values.iter().map(|(_, value)| *value).collect())
            }
        }
    }

    fn evict(window: Duration, values: &mut VecDeque<(Instant, i64)>, now: Instant) {
        while let Some((recorded, _)) = values.front() {
            if now.duration_since(*recorded) <= window {
                break;
            }
            values.pop_front();
        }
    }
}

/// Counts values and keeps a reservoir of them for snapshots.
#[derive(Debug)]
pub struct HistogramStat {
    count: AtomicU64,
    reservoir: Mutex<Reservoir>,
}

impl HistogramStat {
    /// Creates a histogram over the given reservoir.
    pub fn new(reservoir: Reservoir) -> Self {
        Self {
            count: AtomicU64::new(0),
            reservoir: Mutex::new(reservoir),
        }
    }

    /// Records a value.
    pub fn update(&self, value: i64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.reservoir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(value);
    }

    /// Returns the number of values ever recorded.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of the values currently in the reservoir.
    pub fn snapshot(&self) -> Snapshot {
        self.reservoir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_sliding_window_keeps_last_values() {
        let histogram = HistogramStat::new(Reservoir::sliding_window(3));
        for value in 1..=5 {
            histogram.update(value);
        }
        assert_eq!(histogram.count(), 5);
        assert_eq!(histogram.snapshot().values(), &[3, 4, 5]);
    }

    #[test]
    fn test_zero_sized_window_keeps_one_value() {
        let histogram = HistogramStat::new(Reservoir::sliding_window(0));
        histogram.update(7);
        histogram.update(9);
        assert_eq!(histogram.snapshot().values(), &[9]);
    }

    #[test]
    fn test_sliding_time_window_evicts_old_values() {
        let histogram = HistogramStat::new(Reservoir::sliding_time_window(
            Duration::from_millis(20),
        ));
        histogram.update(1);
        thread::sleep(Duration::from_millis(40));
        histogram.update(2);
        assert_eq!(histogram.count(), 2);
        assert_eq!(histogram.snapshot().values(), &[2]);
    }
}

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

//! Supplier-backed gauges.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tally_core::telemetry::Gauge;

/// A function producing the current value of a gauge.
pub type GaugeSupplier = Box<dyn Fn() -> f64 + Send + Sync>;

/// A gauge that calls its supplier on every read.
pub struct GaugeStat {
    supplier: GaugeSupplier,
}

impl GaugeStat {
    /// Creates a gauge reading from `supplier`.
    pub fn new(supplier: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self {
            supplier: Box::new(supplier),
        }
    }
}

impl Gauge for GaugeStat {
    fn value(&self) -> f64 {
        (self.supplier)()
    }
}

impl fmt::Debug for GaugeStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeStat").finish_non_exhaustive()
    }
}

/// A gauge that reuses its last sample until `timeout` has elapsed.
///
/// The cache lock is held while the supplier runs, so concurrent readers of an
/// expired value wait for a single refresh instead of calling the supplier
/// themselves.
pub struct CachedGaugeStat {
    supplier: GaugeSupplier,
    timeout: Duration,
    cache: Mutex<Option<(f64, Instant)>>,
}

impl CachedGaugeStat {
    /// Creates a cached gauge reading from `supplier` at most once per `timeout`.
    pub fn new(timeout: Duration, supplier: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self {
            supplier: Box::new(supplier),
            timeout,
            cache: Mutex::new(None),
        }
    }

    /// The minimum time between two supplier calls.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Gauge for CachedGaugeStat {
    fn value(&self) -> f64 {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match *cache {
            Some((value, sampled_at)) if sampled_at.elapsed() < self.timeout => value,
            _ => {
                let value = (self.supplier)();
                *cache = Some((value, Instant::now()));
                value
            }
        }
    }
}

impl fmt::Debug for CachedGaugeStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedGaugeStat")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_gauge_reads_supplier_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gauge = GaugeStat::new(move || counter.fetch_add(1, Ordering::SeqCst) as f64);
        assert_eq!(gauge.value(), 0.0);
        assert_eq!(gauge.value(), 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cached_gauge_reuses_value_within_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gauge = CachedGaugeStat::new(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst) as f64 + 10.0
        });
        assert_eq!(gauge.value(), 10.0);
        assert_eq!(gauge.value(), 10.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_gauge_refreshes_after_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gauge = CachedGaugeStat::new(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst) as f64
        });
        assert_eq!(gauge.value(), 0.0);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(gauge.value(), 1.0);
    }

    #[test]
    fn test_cached_gauge_refresh_is_single_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gauge = Arc::new(CachedGaugeStat::new(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            42.0
        }));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gauge = gauge.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    gauge.value()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42.0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

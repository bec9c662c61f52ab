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

//! Event rate measurement with exponentially weighted moving averages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Interval at which the moving averages are folded.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// An exponentially weighted moving average over `TICK_INTERVAL` ticks.
#[derive(Debug, Clone, Copy)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        let interval = TICK_INTERVAL.as_secs_f64();
        Self {
            alpha: 1.0 - (-interval / 60.0 / minutes).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    /// Folds `count` events seen during the last interval into the average.
    fn tick(&mut self, count: u64) {
        let instant_rate = count as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }
}

#[derive(Debug)]
struct Rates {
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

/// Counts events and tracks their mean and 1/5/15 minute rates, per second.
#[derive(Debug)]
pub struct MeterStat {
    count: AtomicU64,
    uncounted: AtomicU64,
    start: Instant,
    rates: Mutex<Rates>,
}

impl MeterStat {
    /// Creates a meter with no events.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            count: AtomicU64::new(0),
            uncounted: AtomicU64::new(0),
            start: now,
            rates: Mutex::new(Rates {
                last_tick: now,
                m1: Ewma::over_minutes(1.0),
                m5: Ewma::over_minutes(5.0),
                m15: Ewma::over_minutes(15.0),
            }),
        }
    }

    /// Records `n` events.
    pub fn mark(&self, n: u64) {
        self.tick_if_necessary();
        self.count.fetch_add(n, Ordering::Relaxed);
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the number of events recorded.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns the mean rate since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        count as f64 / elapsed
    }

    /// Returns the one-minute moving average rate.
    pub fn one_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.lock_rates().m1.rate
    }

    /// Returns the five-minute moving average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.lock_rates().m5.rate
    }

    /// Returns the fifteen-minute moving average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.lock_rates().m15.rate
    }

    /// Folds the pending events into the moving averages immediately.
    #[cfg(test)]
    fn tick(&self) {
        let mut rates = self.lock_rates();
        let count = self.uncounted.swap(0, Ordering::Relaxed);
        rates.m1.tick(count);
        rates.m5.tick(count);
        rates.m15.tick(count);
        rates.last_tick = Instant::now();
    }

    fn tick_if_necessary(&self) {
        let mut rates = self.lock_rates();
        let age = rates.last_tick.elapsed();
        if age < TICK_INTERVAL {
            return;
        }
        let ticks = (age.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        // Events are attributed to the first elapsed interval, the rest decay.
        let mut count = self.uncounted.swap(0, Ordering::Relaxed);
        for _ in 0..ticks {
            rates.m1.tick(count);
            rates.m5.tick(count);
            rates.m15.tick(count);
            count = 0;
        }
        rates.last_tick += TICK_INTERVAL * ticks;
    }

    fn lock_rates(&self) -> std::sync::MutexGuard<'_, Rates> {
        self.rates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MeterStat {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_counts_events() {
        let meter = MeterStat::new();
        meter.mark(1);
        meter.mark(4);
        assert_eq!(meter.count(), 5);
        assert!(meter.mean_rate() > 0.0);
    }

    #[test]
    fn test_empty_meter_rates_are_zero() {
        let meter = MeterStat::new();
        assert_eq!(meter.count(), 0);
        assert_eq!(meter.mean_rate(), 0.0);
        assert_eq!(meter.one_minute_rate(), 0.0);
        assert_eq!(meter.fifteen_minute_rate(), 0.0);
    }

    #[test]
    fn test_first_tick_sets_instant_rate() {
        let meter = MeterStat::new();
        meter.mark(60);
        meter.tick();
        // 60 events over a 5 second interval.
        assert!((meter.one_minute_rate() - 12.0).abs() < 1e-9);
        assert!((meter.five_minute_rate() - 12.0).abs() < 1e-9);
        assert!((meter.fifteen_minute_rate() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_decay_without_events() {
        let meter = MeterStat::new();
        meter.mark(60);
        meter.tick();
        meter.tick();
        let m1 = meter.one_minute_rate();
        let m15 = meter.fifteen_minute_rate();
        assert!(m1 < 12.0);
        assert!(m15 < 12.0);
        // The shorter window forgets faster.
        assert!(m1 < m15);
    }
}

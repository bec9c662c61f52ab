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

//! Provides RAII-based timers for automatically recording durations.

use tally_core::telemetry::Timer;
use tally_core::Stopwatch;

/// Times the enclosing scope and records the duration in a [`Timer`] when
/// dropped.
///
/// The measurement is recorded on every exit path, including early returns
/// and unwinding.
pub struct ScopedMetricTimer<'a, T: Timer + ?Sized> {
    stopwatch: Stopwatch,
    timer: &'a T,
}

impl<'a, T: Timer + ?Sized> ScopedMetricTimer<'a, T> {
    /// Starts timing immediately.
    pub fn new(timer: &'a T) -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            timer,
        }
    }
}

impl<T: Timer + ?Sized> Drop for ScopedMetricTimer<'_, T> {
    fn drop(&mut self) {
        self.timer.update(self.stopwatch.elapsed());
    }
}

/// Scoped timing for any [`Timer`], including trait objects and collections.
pub trait TimerExt: Timer {
    /// Starts a scoped measurement that ends when the guard is dropped.
    fn start(&self) -> ScopedMetricTimer<'_, Self> {
        ScopedMetricTimer::new(self)
    }

    /// Runs `f` and records how long it took.
    fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.start();
        f()
    }
}

impl<T: Timer + ?Sized> TimerExt for T {}

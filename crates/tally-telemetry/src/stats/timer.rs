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

//! Duration statistics: an event rate plus a distribution.

use super::histogram::{HistogramStat, Reservoir};
use super::meter::MeterStat;
use std::time::Duration;
use tally_core::telemetry::Snapshot;

/// A meter of events paired with a histogram of their durations in nanoseconds.
#[derive(Debug)]
pub struct TimerStat {
    meter: MeterStat,
    histogram: HistogramStat,
}

impl TimerStat {
    /// Creates a timer whose durations are kept in `reservoir`.
    pub fn new(reservoir: Reservoir) -> Self {
        Self {
            meter: MeterStat::new(),
            histogram: HistogramStat::new(reservoir),
        }
    }

    /// Records one event that lasted `duration`.
    pub fn update(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    /// The event rates.
    pub fn meter(&self) -> &MeterStat {
        &self.meter
    }

    /// Returns the number of events recorded.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Returns a snapshot of the recorded durations.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_records_durations_in_nanos() {
        let timer = TimerStat::new(Reservoir::sliding_window(16));
        timer.update(Duration::from_millis(2));
        timer.update(Duration::from_micros(5));
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.meter().count(), 2);
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.min(), 5_000);
        assert_eq!(snapshot.max(), 2_000_000);
    }
}

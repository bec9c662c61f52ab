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

//! Abstract definitions for metrics: kinds, errors and the instrument contracts.

use super::level::Level;
use std::fmt::{self, Display};
use std::time::Duration;

/// The fundamental kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// A value that can be incremented and decremented.
    Counter,
    /// Measures the rate of events.
    Meter,
    /// Tracks the distribution of a set of values.
    Histogram,
    /// A meter of events combined with a histogram of their durations.
    Timer,
    /// A value read from a supplier on demand.
    Gauge,
    /// A gauge that only reads its supplier once per timeout.
    CachedGauge,
}

impl MetricKind {
    /// Returns the lower-case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Meter => "meter",
            MetricKind::Histogram => "histogram",
            MetricKind::Timer => "timer",
            MetricKind::Gauge => "gauge",
            MetricKind::CachedGauge => "cached gauge",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specialized `Result` type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised while creating, looking up or configuring metrics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// The name does not follow the metric name grammar.
    #[error("invalid metric name '{name}': {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },
    /// An argument was not acceptable for the requested operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The name is already used by a metric of another kind.
    #[error("metric '{name}' is already registered as a {found}, not a {expected}")]
    TypeMismatch {
        /// The metric name.
        name: String,
        /// The kind that was requested.
        expected: MetricKind,
        /// The kind that is registered.
        found: MetricKind,
    },
    /// The name is already used by a metric created with another level.
    #[error("metric '{name}' is already registered with level {registered}, not {requested}")]
    LevelMismatch {
        /// The metric name.
        name: String,
        /// The level the metric was created with.
        registered: Level,
        /// The level that was requested.
        requested: Level,
    },
    /// Nothing is registered under the name.
    #[error("metric '{0}' not found")]
    MetricNotFound(String),
}

/// A counter of events that can go up or down.
pub trait Counter: Send + Sync {
    /// Increments the counter by one.
    fn inc(&self) {
        self.inc_by(1);
    }

    /// Increments the counter by `n`.
    fn inc_by(&self, n: i64);

    /// Decrements the counter by one.
    fn dec(&self) {
        self.dec_by(1);
    }

    /// Decrements the counter by `n`.
    fn dec_by(&self, n: i64);

    /// Returns the current count.
    fn count(&self) -> i64;
}

/// Measures the rate at which events occur.
pub trait Meter: Send + Sync {
    /// Marks the occurrence of one event.
    fn mark(&self) {
        self.mark_n(1);
    }

    /// Marks the occurrence of `n` events.
    fn mark_n(&self, n: u64);

    /// Returns the number of events marked.
    fn count(&self) -> u64;

    /// Returns the mean rate, in events per second, since creation.
    fn mean_rate(&self) -> f64;

    /// Returns the one-minute exponentially weighted moving average rate.
    fn one_minute_rate(&self) -> f64;

    /// Returns the five-minute exponentially weighted moving average rate.
    fn five_minute_rate(&self) -> f64;

    /// Returns the fifteen-minute exponentially weighted moving average rate.
    fn fifteen_minute_rate(&self) -> f64;
}

/// Tracks the statistical distribution of values.
pub trait Histogram: Send + Sync {
    /// Records a value.
    fn update(&self, value: i64);

    /// Returns the number of values recorded.
    fn count(&self) -> u64;

    /// Returns a snapshot of the recorded values.
    fn snapshot(&self) -> Snapshot;
}

/// Measures the rate of events and the distribution of their durations.
///
/// Durations are recorded in nanoseconds. Scoped timing helpers are provided
/// on top of this trait by the telemetry crate.
pub trait Timer: Send + Sync {
    /// Records the duration of one event.
    fn update(&self, duration: Duration);

    /// Returns the number of events timed.
    fn count(&self) -> u64;

    /// Returns the mean rate, in events per second, since creation.
    fn mean_rate(&self) -> f64;

    /// Returns the one-minute exponentially weighted moving average rate.
    fn one_minute_rate(&self) -> f64;

    /// Returns the five-minute exponentially weighted moving average rate.
    fn five_minute_rate(&self) -> f64;

    /// Returns the fifteen-minute exponentially weighted moving average rate.
    fn fifteen_minute_rate(&self) -> f64;

    /// Returns a snapshot of the recorded durations, in nanoseconds.
    fn snapshot(&self) -> Snapshot;
}

/// A metric whose value is read on demand.
pub trait Gauge: Send + Sync {
    /// Returns the current value.
    fn value(&self) -> f64;
}

/// An immutable, sorted view of the values recorded by a histogram or timer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: Vec<i64>,
}

impl Snapshot {
    /// Creates a snapshot from unsorted values.
    pub fn new(mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { values }
    }

    /// Returns the value at the given quantile, interpolating between the
    /// two closest recorded values.
    ///
    /// Quantiles outside `[0, 1]` are clamped.
    pub fn value(&self, quantile: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let quantile = if quantile.is_nan() {
            0.0
        } else {
            quantile.clamp(0.0, 1.0)
        };
        let pos = quantile * (self.values.len() + 1) as f64;
        let index = pos as usize;
        if index < 1 {
            return self.values[0] as f64;
        }
        if index >= self.values.len() {
            return self.values[self.values.len() - 1] as f64;
        }
        let lower = self.values[index - 1] as f64;
        let upper = self.values[index] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }

    /// The median value.
    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    /// The value at the 75th percentile.
    pub fn p75(&self) -> f64 {
        self.value(0.75)
    }

    /// The value at the 95th percentile.
    pub fn p95(&self) -> f64 {
        self.value(0.95)
    }

    /// The value at the 98th percentile.
    pub fn p98(&self) -> f64 {
        self.value(0.98)
    }

    /// The value at the 99th percentile.
    pub fn p99(&self) -> f64 {
        self.value(0.99)
    }

    /// The value at the 99.9th percentile.
    pub fn p999(&self) -> f64 {
        self.value(0.999)
    }

    /// The smallest value, or 0 when empty.
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    /// The largest value, or 0 when empty.
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    /// The arithmetic mean, or 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|&v| v as f64).sum::<f64>() / self.values.len() as f64
    }

    /// The sample standard deviation, or 0 with fewer than two values.
    pub fn std_dev(&self) -> f64 {
        if self.values.len() <= 1 {
            return 0.0;
        }
        let mean = self.mean();
        let sum = self
            .values
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum::<f64>();
        (sum / (self.values.len() - 1) as f64).sqrt()
    }

    /// The number of values in the snapshot.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// The sorted values.
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

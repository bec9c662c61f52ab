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

//! Point-in-time readings of stored metrics, as consumed by reporters.

use super::backend::StoredMetric;
use serde::Serialize;
use tally_core::telemetry::{Gauge, Snapshot};

/// The reading of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// The metric name.
    pub name: String,
    /// The values read from the metric.
    #[serde(flatten)]
    pub value: SampleValue,
}

/// The values read from a metric, by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SampleValue {
    /// A counter reading.
    Counter {
        /// The current count.
        count: i64,
    },
    /// A meter reading.
    Meter {
        /// The number of events.
        count: u64,
        /// The event rates, per second.
        rates: RateSample,
    },
    /// A histogram reading.
    Histogram {
        /// The number of values recorded.
        count: u64,
        /// Statistics over the reservoir.
        distribution: DistributionSample,
    },
    /// A timer reading. Durations are in nanoseconds.
    Timer {
        /// The number of events.
        count: u64,
        /// The event rates, per second.
        rates: RateSample,
        /// Statistics over the recorded durations.
        distribution: DistributionSample,
    },
    /// A gauge reading.
    Gauge {
        /// The current value.
        value: f64,
    },
}

/// Mean and moving average rates, per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct RateSample {
    pub mean_rate: f64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
}

/// Summary statistics of a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct DistributionSample {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
}

impl From<&Snapshot> for DistributionSample {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            min: snapshot.min(),
            max: snapshot.max(),
            mean: snapshot.mean(),
            std_dev: snapshot.std_dev(),
            median: snapshot.median(),
            p75: snapshot.p75(),
            p95: snapshot.p95(),
            p98: snapshot.p98(),
            p99: snapshot.p99(),
            p999: snapshot.p999(),
        }
    }
}

impl MetricSample {
    /// Reads the current values of `metric`.
    pub fn read(name: impl Into<String>, metric: &StoredMetric) -> Self {
        let value = match metric {
            StoredMetric::Counter(counter) => SampleValue::Counter {
                count: counter.count(),
            },
            StoredMetric::Meter(meter) => SampleValue::Meter {
                count: meter.count(),
                rates: RateSample {
                    mean_rate: meter.mean_rate(),
                    m1_rate: meter.one_minute_rate(),
                    m5_rate: meter.five_minute_rate(),
                    m15_rate: meter.fifteen_minute_rate(),
                },
            },
            StoredMetric::Histogram(histogram) => SampleValue::Histogram {
                count: histogram.count(),
                distribution: (&histogram.snapshot()).into(),
            },
            StoredMetric::Timer(timer) => {
                let meter = timer.meter();
                SampleValue::Timer {
                    count: timer.count(),
                    rates: RateSample {
                        mean_rate: meter.mean_rate(),
                        m1_rate: meter.one_minute_rate(),
                        m5_rate: meter.five_minute_rate(),
                        m15_rate: meter.fifteen_minute_rate(),
                    },
                    distribution: (&timer.snapshot()).into(),
                }
            }
            StoredMetric::Gauge(gauge) => SampleValue::Gauge {
                value: gauge.value(),
            },
            StoredMetric::CachedGauge(gauge) => SampleValue::Gauge {
                value: gauge.value(),
            },
        };
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CounterStat, GaugeStat};
    use std::sync::Arc;

    #[test]
    fn test_counter_sample_serializes_with_type_tag() {
        let counter = Arc::new(CounterStat::new());
        counter.add(3);
        let sample = MetricSample::read("a.b.count", &StoredMetric::Counter(counter));
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "a.b.count", "type": "counter", "count": 3})
        );
    }

    #[test]
    fn test_gauge_sample() {
        let gauge = Arc::new(GaugeStat::new(|| 1.5));
        let sample = MetricSample::read("a.b.value", &StoredMetric::Gauge(gauge));
        assert_eq!(sample.value, SampleValue::Gauge { value: 1.5 });
    }
}

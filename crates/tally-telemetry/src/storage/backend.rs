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

//! The storage seam between instruments and reporters.

use super::sample::MetricSample;
use crate::stats::{CachedGaugeStat, CounterStat, GaugeStat, HistogramStat, MeterStat, TimerStat};
use std::fmt::Debug;
use std::sync::Arc;

/// A statistics holder stored in a backend under a metric name.
///
/// Cloning is cheap: the statistics are shared with the instrument that
/// updates them.
#[derive(Debug, Clone)]
pub enum StoredMetric {
    /// A counter.
    Counter(Arc<CounterStat>),
    /// A meter.
    Meter(Arc<MeterStat>),
    /// A histogram.
    Histogram(Arc<HistogramStat>),
    /// A timer.
    Timer(Arc<TimerStat>),
    /// A gauge.
    Gauge(Arc<GaugeStat>),
    /// A cached gauge.
    CachedGauge(Arc<CachedGaugeStat>),
}

/// Trait defining the interface for metrics storage backends.
///
/// A backend is the name-keyed value sink reporters read from. It holds no
/// level or enablement information: callers pass a filter when sampling.
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Store a metric under `name`, returning the metric it replaced
    fn put_metric(&self, name: &str, metric: StoredMetric) -> Option<StoredMetric>;

    /// Retrieve a metric by name
    fn get_metric(&self, name: &str) -> Option<StoredMetric>;

    /// Check if a metric exists
    fn contains_metric(&self, name: &str) -> bool {
        self.get_metric(name).is_some()
    }

    /// Remove a metric, returning whether it existed
    fn remove_metric(&self, name: &str) -> bool;

    /// Get all metric names currently stored, sorted
    fn list_metric_names(&self) -> Vec<String>;

    /// Clear all metrics
    fn clear_all(&self);

    /// Get the number of metrics stored
    fn metric_count(&self) -> usize;

    /// Read every metric whose name passes `filter`, sorted by name
    fn samples(&self, filter: &dyn Fn(&str) -> bool) -> Vec<MetricSample> {
        self.list_metric_names()
            .into_iter()
            .filter(|name| filter(name))
            .filter_map(|name| {
                let metric = self.get_metric(&name)?;
                Some(MetricSample::read(name, &metric))
            })
            .collect()
    }
}

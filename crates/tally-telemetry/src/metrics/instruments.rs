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

//! Level-gated instruments.
//!
//! Each instrument pairs the shared statistics with a [`MetricState`] that
//! caches whether the metric is enabled. Mutations are dropped while the
//! metric is disabled; reads always return the stored values.

use crate::stats::{CachedGaugeStat, CounterStat, GaugeStat, HistogramStat, MeterStat, TimerStat};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_core::telemetry::{Counter, Gauge, Histogram, Level, Meter, Snapshot, Timer};

/// Name, creation level and cached enablement of a registered metric.
#[derive(Debug)]
pub struct MetricState {
    name: String,
    level: Level,
    enabled: AtomicBool,
}

impl MetricState {
    pub(crate) fn new(name: impl Into<String>, level: Level, enabled: bool) -> Self {
        Self {
            name: name.into(),
            level,
            enabled: AtomicBool::new(enabled),
        }
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The level the metric was created with.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Whether updates are currently recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

/// A gated counter.
#[derive(Debug)]
pub struct CounterImpl {
    state: MetricState,
    stat: Arc<CounterStat>,
}

impl CounterImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<CounterStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Counter for CounterImpl {
    fn inc_by(&self, n: i64) {
        if self.state.is_enabled() {
            self.stat.add(n);
        }
    }

    fn dec_by(&self, n: i64) {
        if self.state.is_enabled() {
            self.stat.sub(n);
        }
    }

    fn count(&self) -> i64 {
        self.stat.count()
    }
}

/// A gated meter.
#[derive(Debug)]
pub struct MeterImpl {
    state: MetricState,
    stat: Arc<MeterStat>,
}

impl MeterImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<MeterStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Meter for MeterImpl {
    fn mark_n(&self, n: u64) {
        if self.state.is_enabled() {
            self.stat.mark(n);
        }
    }

    fn count(&self) -> u64 {
        self.stat.count()
    }

    fn mean_rate(&self) -> f64 {
        self.stat.mean_rate()
    }

    fn one_minute_rate(&self) -> f64 {
        self.stat.one_minute_rate()
    }

    fn five_minute_rate(&self) -> f64 {
        self.stat.five_minute_rate()
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.stat.fifteen_minute_rate()
    }
}

/// A gated histogram.
#[derive(Debug)]
pub struct HistogramImpl {
    state: MetricState,
    stat: Arc<HistogramStat>,
}

impl HistogramImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<HistogramStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Histogram for HistogramImpl {
    fn update(&self, value: i64) {
        if self.state.is_enabled() {
            self.stat.update(value);
        }
    }

    fn count(&self) -> u64 {
        self.stat.count()
    }

    fn snapshot(&self) -> Snapshot {
        self.stat.snapshot()
    }
}

/// A gated timer.
#[derive(Debug)]
pub struct TimerImpl {
    state: MetricState,
    stat: Arc<TimerStat>,
}

impl TimerImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<TimerStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Timer for TimerImpl {
    fn update(&self, duration: Duration) {
        if self.state.is_enabled() {
            self.stat.update(duration);
        }
    }

    fn count(&self) -> u64 {
        self.stat.count()
    }

    fn mean_rate(&self) -> f64 {
        self.stat.meter().mean_rate()
    }

    fn one_minute_rate(&self) -> f64 {
        self.stat.meter().one_minute_rate()
    }

    fn five_minute_rate(&self) -> f64 {
        self.stat.meter().five_minute_rate()
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.stat.meter().fifteen_minute_rate()
    }

    fn snapshot(&self) -> Snapshot {
        self.stat.snapshot()
    }
}

/// A registered gauge. Gauges are read-only, so the cached enablement is
/// only used by reporters to skip them.
#[derive(Debug)]
pub struct GaugeImpl {
    state: MetricState,
    stat: Arc<GaugeStat>,
}

impl GaugeImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<GaugeStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Gauge for GaugeImpl {
    fn value(&self) -> f64 {
        self.stat.value()
    }
}

/// A registered cached gauge.
#[derive(Debug)]
pub struct CachedGaugeImpl {
    state: MetricState,
    stat: Arc<CachedGaugeStat>,
}

impl CachedGaugeImpl {
    pub(crate) fn new(state: MetricState, stat: Arc<CachedGaugeStat>) -> Self {
        Self { state, stat }
    }

    /// The metric state.
    pub fn state(&self) -> &MetricState {
        &self.state
    }
}

impl Gauge for CachedGaugeImpl {
    fn value(&self) -> f64 {
        self.stat.value()
    }
}

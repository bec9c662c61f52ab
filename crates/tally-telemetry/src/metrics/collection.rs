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

//! Fan-out metrics for annotated names.
//!
//! A collection forwards every update to its primary metric and then to each
//! affected ancestor, in order. Reads only consult the primary metric: the
//! ancestors are independent metrics with their own totals.
//!
//! Fan-out is not transactional. If an ancestor panics, the updates already
//! applied to the primary and earlier ancestors are kept.

use std::sync::Arc;
use std::time::Duration;
use tally_core::telemetry::{Counter, Histogram, Meter, Snapshot, Timer};

/// A primary metric plus the ancestors it also updates.
pub struct MetricCollection<M: ?Sized> {
    primary: Arc<M>,
    affected: Vec<Arc<M>>,
}

impl<M: ?Sized> MetricCollection<M> {
    /// Creates a collection. `affected` is ordered from the least specific
    /// ancestor to the most specific one.
    pub fn new(primary: Arc<M>, affected: Vec<Arc<M>>) -> Self {
        Self { primary, affected }
    }

    /// The metric reads are served from.
    pub fn primary(&self) -> &Arc<M> {
        &self.primary
    }

    /// The ancestors updated after the primary metric.
    pub fn affected(&self) -> &[Arc<M>] {
        &self.affected
    }

    fn for_each(&self, mut update: impl FnMut(&M)) {
        update(&self.primary);
        for metric in &self.affected {
            update(metric);
        }
    }
}

impl<C: Counter + ?Sized> Counter for MetricCollection<C> {
    fn inc_by(&self, n: i64) {
        self.for_each(|counter| counter.inc_by(n));
    }

    fn dec_by(&self, n: i64) {
        self.for_each(|counter| counter.dec_by(n));
    }

    fn count(&self) -> i64 {
        self.primary.count()
    }
}

impl<T: Meter + ?Sized> Meter for MetricCollection<T> {
    fn mark_n(&self, n: u64) {
        self.for_each(|meter| meter.mark_n(n));
    }

    fn count(&self) -> u64 {
        self.primary.count()
    }

    fn mean_rate(&self) -> f64 {
        self.primary.mean_rate()
    }

    fn one_minute_rate(&self) -> f64 {
        self.primary.one_minute_rate()
    }

    fn five_minute_rate(&self) -> f64 {
        self.primary.five_minute_rate()
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.primary.fifteen_minute_rate()
    }
}

impl<H: Histogram + ?Sized> Histogram for MetricCollection<H> {
    fn update(&self, value: i64) {
        self.for_each(|histogram| histogram.update(value));
    }

    fn count(&self) -> u64 {
        self.primary.count()
    }

    fn snapshot(&self) -> Snapshot {
        self.primary.snapshot()
    }
}

impl<T: Timer + ?Sized> Timer for MetricCollection<T> {
    fn update(&self, duration: Duration) {
        self.for_each(|timer| timer.update(duration));
    }

    fn count(&self) -> u64 {
        self.primary.count()
    }

    fn mean_rate(&self) -> f64 {
        self.primary.mean_rate()
    }

    fn one_minute_rate(&self) -> f64 {
        self.primary.one_minute_rate()
    }

    fn five_minute_rate(&self) -> f64 {
        self.primary.five_minute_rate()
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.primary.fifteen_minute_rate()
    }

    fn snapshot(&self) -> Snapshot {
        self.primary.snapshot()
    }
}

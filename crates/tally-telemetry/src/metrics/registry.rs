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

//! Registry for creating, gating and removing metrics.

use super::collection::MetricCollection;
use super::instruments::{
    CachedGaugeImpl, CounterImpl, GaugeImpl, HistogramImpl, MeterImpl, MetricState, TimerImpl,
};
use super::level_config::LevelConfiguration;
use super::listeners::{
    EnabledStatusListener, ListenerId, ListenerList, MetricLevelListener, RootLevelListener,
};
use crate::config::ReservoirConfig;
use crate::stats::{CachedGaugeStat, CounterStat, GaugeStat, HistogramStat, MeterStat, TimerStat};
use crate::storage::{InMemoryBackend, MetricsBackend, StoredMetric};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tally_core::telemetry::name::{hierarchy_names, is_annotated};
use tally_core::telemetry::{
    Counter, Gauge, Histogram, Level, Meter, MetricKind, MetricsError, MetricsResult, Timer,
};

/// Decides whether the metric with the given name should be reported.
pub type MetricFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A registered metric.
#[derive(Debug, Clone)]
enum MetricHandle {
    Counter(Arc<CounterImpl>),
    Meter(Arc<MeterImpl>),
    Histogram(Arc<HistogramImpl>),
    Timer(Arc<TimerImpl>),
    Gauge(Arc<GaugeImpl>),
    CachedGauge(Arc<CachedGaugeImpl>),
}

impl MetricHandle {
    fn kind(&self) -> MetricKind {
        match self {
            MetricHandle::Counter(_) => MetricKind::Counter,
            MetricHandle::Meter(_) => MetricKind::Meter,
            MetricHandle::Histogram(_) => MetricKind::Histogram,
            MetricHandle::Timer(_) => MetricKind::Timer,
            MetricHandle::Gauge(_) => MetricKind::Gauge,
            MetricHandle::CachedGauge(_) => MetricKind::CachedGauge,
        }
    }

    fn state(&self) -> &MetricState {
        match self {
            MetricHandle::Counter(metric) => metric.state(),
            MetricHandle::Meter(metric) => metric.state(),
            MetricHandle::Histogram(metric) => metric.state(),
            MetricHandle::Timer(metric) => metric.state(),
            MetricHandle::Gauge(metric) => metric.state(),
            MetricHandle::CachedGauge(metric) => metric.state(),
        }
    }
}

/// A registered fan-out collection.
#[derive(Clone)]
enum CollectionHandle {
    Counter(Arc<MetricCollection<dyn Counter>>),
    Meter(Arc<MetricCollection<dyn Meter>>),
    Histogram(Arc<MetricCollection<dyn Histogram>>),
    Timer(Arc<MetricCollection<dyn Timer>>),
}

impl CollectionHandle {
    fn kind(&self) -> MetricKind {
        match self {
            CollectionHandle::Counter(_) => MetricKind::Counter,
            CollectionHandle::Meter(_) => MetricKind::Meter,
            CollectionHandle::Histogram(_) => MetricKind::Histogram,
            CollectionHandle::Timer(_) => MetricKind::Timer,
        }
    }
}

struct CollectionEntry {
    handle: CollectionHandle,
    /// The plain names the collection updates, primary first.
    members: Vec<String>,
}

type RecordMap = HashMap<String, MetricHandle>;

/// Central registry for metrics.
///
/// The registry owns one record per plain metric name. A record keeps the
/// level the metric was created with and a cached enabled flag, derived from
/// the global enabled status and the [`LevelConfiguration`]. Every change to
/// either recomputes the flag of all records before listeners are notified,
/// so the hot path only reads an atomic.
///
/// Annotated names (`a[+].b.count`) produce [`MetricCollection`]s that fan
/// updates out to the plain metrics of the hierarchy.
pub struct MetricsRegistry {
    backend: Arc<dyn MetricsBackend>,
    records: Arc<RwLock<RecordMap>>,
    collections: RwLock<HashMap<String, CollectionEntry>>,
    levels: LevelConfiguration,
    reservoir: ReservoirConfig,
    enabled: AtomicBool,
    /// Serializes configuration changes with the refresh they trigger.
    admin: Mutex<()>,
    enabled_listeners: ListenerList<EnabledStatusListener>,
    root_level_listeners: ListenerList<RootLevelListener>,
    metric_level_listeners: ListenerList<MetricLevelListener>,
}

impl MetricsRegistry {
    /// Create a new, enabled registry with the default in-memory backend and
    /// an `INFO` root level
    pub fn new() -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()))
    }

    /// Create a new, enabled registry with a custom backend
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self::configured(
            backend,
            LevelConfiguration::default(),
            ReservoirConfig::default(),
            true,
        )
    }

    /// Create a registry from explicit settings
    pub fn configured(
        backend: Arc<dyn MetricsBackend>,
        levels: LevelConfiguration,
        reservoir: ReservoirConfig,
        enabled: bool,
    ) -> Self {
        log::info!(
            "Metrics registry created (enabled: {}, root level: {}).",
            enabled,
            levels.root_level()
        );
        Self {
            backend,
            records: Arc::new(RwLock::new(HashMap::new())),
            collections: RwLock::new(HashMap::new()),
            levels,
            reservoir,
            enabled: AtomicBool::new(enabled),
            admin: Mutex::new(()),
            enabled_listeners: ListenerList::new(),
            root_level_listeners: ListenerList::new(),
            metric_level_listeners: ListenerList::new(),
        }
    }

    /// Get direct access to the backend reporters read from
    pub fn backend(&self) -> &Arc<dyn MetricsBackend> {
        &self.backend
    }

    // --- Metric creation ---

    /// Get or create a counter.
    ///
    /// With no `ancestors`, `name` must be a plain name and a single counter
    /// is returned. Otherwise `name` is an annotated name and a collection
    /// is returned, created with the levels `[level, ancestors...]` paired
    /// with [`hierarchy_names`].
    pub fn counter(
        &self,
        name: &str,
        level: Level,
        ancestors: &[Level],
    ) -> MetricsResult<Arc<dyn Counter>> {
        if ancestors.is_empty() {
            return self.counter_metric(name, level);
        }
        let collection = self.get_or_create_collection(
            name,
            &levels_of(level, ancestors),
            MetricKind::Counter,
            |member, level| self.counter_metric(member, level),
            |handle| match handle {
                CollectionHandle::Counter(collection) => Some(collection.clone()),
                _ => None,
            },
            CollectionHandle::Counter,
        )?;
        Ok(collection)
    }

    /// Get or create a meter. See [`MetricsRegistry::counter`] for `ancestors`.
    pub fn meter(
        &self,
        name: &str,
        level: Level,
        ancestors: &[Level],
    ) -> MetricsResult<Arc<dyn Meter>> {
        if ancestors.is_empty() {
            return self.meter_metric(name, level);
        }
        let collection = self.get_or_create_collection(
            name,
            &levels_of(level, ancestors),
            MetricKind::Meter,
            |member, level| self.meter_metric(member, level),
            |handle| match handle {
                CollectionHandle::Meter(collection) => Some(collection.clone()),
                _ => None,
            },
            CollectionHandle::Meter,
        )?;
        Ok(collection)
    }

    /// Get or create a histogram. See [`MetricsRegistry::counter`] for `ancestors`.
    pub fn histogram(
        &self,
        name: &str,
        level: Level,
        ancestors: &[Level],
    ) -> MetricsResult<Arc<dyn Histogram>> {
        if ancestors.is_empty() {
            return self.histogram_metric(name, level);
        }
        let collection = self.get_or_create_collection(
            name,
            &levels_of(level, ancestors),
            MetricKind::Histogram,
            |member, level| self.histogram_metric(member, level),
            |handle| match handle {
                CollectionHandle::Histogram(collection) => Some(collection.clone()),
                _ => None,
            },
            CollectionHandle::Histogram,
        )?;
        Ok(collection)
    }

    /// Get or create a timer. See [`MetricsRegistry::counter`] for `ancestors`.
    pub fn timer(
        &self,
        name: &str,
        level: Level,
        ancestors: &[Level],
    ) -> MetricsResult<Arc<dyn Timer>> {
        if ancestors.is_empty() {
            return self.timer_metric(name, level);
        }
        let collection = self.get_or_create_collection(
            name,
            &levels_of(level, ancestors),
            MetricKind::Timer,
            |member, level| self.timer_metric(member, level),
            |handle| match handle {
                CollectionHandle::Timer(collection) => Some(collection.clone()),
                _ => None,
            },
            CollectionHandle::Timer,
        )?;
        Ok(collection)
    }

    /// Register a gauge reading from `supplier`.
    ///
    /// Registering the same name again with the same level returns the
    /// existing gauge and drops the new supplier.
    pub fn gauge(
        &self,
        name: &str,
        level: Level,
        supplier: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> MetricsResult<Arc<dyn Gauge>> {
        let gauge = self.get_or_create(
            name,
            level,
            MetricKind::Gauge,
            |handle| match handle {
                MetricHandle::Gauge(gauge) => Some(gauge.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(GaugeStat::new(supplier));
                let gauge = Arc::new(GaugeImpl::new(state, stat.clone()));
                (MetricHandle::Gauge(gauge), StoredMetric::Gauge(stat))
            },
        )?;
        Ok(gauge)
    }

    /// Register a gauge that calls `supplier` at most once per `timeout`.
    pub fn cached_gauge(
        &self,
        name: &str,
        level: Level,
        timeout: Duration,
        supplier: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> MetricsResult<Arc<dyn Gauge>> {
        let gauge = self.get_or_create(
            name,
            level,
            MetricKind::CachedGauge,
            |handle| match handle {
                MetricHandle::CachedGauge(gauge) => Some(gauge.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(CachedGaugeStat::new(timeout, supplier));
                let gauge = Arc::new(CachedGaugeImpl::new(state, stat.clone()));
                (MetricHandle::CachedGauge(gauge), StoredMetric::CachedGauge(stat))
            },
        )?;
        Ok(gauge)
    }

    fn counter_metric(&self, name: &str, level: Level) -> MetricsResult<Arc<dyn Counter>> {
        let counter = self.get_or_create(
            name,
            level,
            MetricKind::Counter,
            |handle| match handle {
                MetricHandle::Counter(counter) => Some(counter.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(CounterStat::new());
                let counter = Arc::new(CounterImpl::new(state, stat.clone()));
                (MetricHandle::Counter(counter), StoredMetric::Counter(stat))
            },
        )?;
        Ok(counter)
    }

    fn meter_metric(&self, name: &str, level: Level) -> MetricsResult<Arc<dyn Meter>> {
        let meter = self.get_or_create(
            name,
            level,
            MetricKind::Meter,
            |handle| match handle {
                MetricHandle::Meter(meter) => Some(meter.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(MeterStat::new());
                let meter = Arc::new(MeterImpl::new(state, stat.clone()));
                (MetricHandle::Meter(meter), StoredMetric::Meter(stat))
            },
        )?;
        Ok(meter)
    }

    fn histogram_metric(&self, name: &str, level: Level) -> MetricsResult<Arc<dyn Histogram>> {
        let histogram = self.get_or_create(
            name,
            level,
            MetricKind::Histogram,
            |handle| match handle {
                MetricHandle::Histogram(histogram) => Some(histogram.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(HistogramStat::new(self.reservoir.build()));
                let histogram = Arc::new(HistogramImpl::new(state, stat.clone()));
                (MetricHandle::Histogram(histogram), StoredMetric::Histogram(stat))
            },
        )?;
        Ok(histogram)
    }

    fn timer_metric(&self, name: &str, level: Level) -> MetricsResult<Arc<dyn Timer>> {
        let timer = self.get_or_create(
            name,
            level,
            MetricKind::Timer,
            |handle| match handle {
                MetricHandle::Timer(timer) => Some(timer.clone()),
                _ => None,
            },
            |state| {
                let stat = Arc::new(TimerStat::new(self.reservoir.build()));
                let timer = Arc::new(TimerImpl::new(state, stat.clone()));
                (MetricHandle::Timer(timer), StoredMetric::Timer(stat))
            },
        )?;
        Ok(timer)
    }

    /// Returns the metric registered under the plain `name`, creating it with
    /// `create` when absent. Creation happens under the write lock so racing
    /// callers observe a single instance.
    fn get_or_create<T: ?Sized>(
        &self,
        name: &str,
        level: Level,
        kind: MetricKind,
        extract: impl Fn(&MetricHandle) -> Option<Arc<T>>,
        create: impl FnOnce(MetricState) -> (MetricHandle, StoredMetric),
    ) -> MetricsResult<Arc<T>> {
        if is_annotated(name) {
            return Err(MetricsError::InvalidArgument(format!(
                "annotated name '{name}' can only be used with ancestor levels"
            )));
        }

        if let Some(handle) = self.read_records().get(name) {
            return existing(name, handle, level, kind, &extract);
        }

        let mut records = self.write_records();
        match records.entry(name.to_string()) {
            Entry::Occupied(entry) => existing(name, entry.get(), level, kind, &extract),
            Entry::Vacant(entry) => {
                let enabled = self.levels.is_enabled(name, level, self.is_enabled());
                let (handle, stored) = create(MetricState::new(name, level, enabled));
                self.backend.put_metric(name, stored);
                log::debug!("Created {kind} '{name}' (level {level}, enabled {enabled}).");
                let handle: &MetricHandle = entry.insert(handle);
                extract(handle).ok_or_else(|| type_mismatch(name, kind, handle.kind()))
            }
        }
    }

    fn get_or_create_collection<T: ?Sized>(
        &self,
        name: &str,
        levels: &[Level],
        kind: MetricKind,
        member: impl Fn(&str, Level) -> MetricsResult<Arc<T>>,
        extract: impl Fn(&CollectionHandle) -> Option<Arc<MetricCollection<T>>>,
        wrap: impl FnOnce(Arc<MetricCollection<T>>) -> CollectionHandle,
    ) -> MetricsResult<Arc<MetricCollection<T>>> {
        let names = hierarchy_names(name)?;
        if names.len() != levels.len() {
            return Err(MetricsError::InvalidArgument(format!(
                "'{name}' expands to {} metrics but {} levels were given",
                names.len(),
                levels.len()
            )));
        }

        if let Some(entry) = self.read_collections().get(name) {
            return extract(&entry.handle)
                .ok_or_else(|| type_mismatch(name, kind, entry.handle.kind()));
        }

        let mut metrics = names
            .iter()
            .zip(levels)
            .map(|(member_name, level)| member(member_name, *level))
            .collect::<MetricsResult<Vec<_>>>()?;
        let primary = metrics.remove(0);
        let collection = Arc::new(MetricCollection::new(primary, metrics));

        let mut collections = self.write_collections();
        match collections.entry(name.to_string()) {
            Entry::Occupied(entry) => extract(&entry.get().handle)
                .ok_or_else(|| type_mismatch(name, kind, entry.get().handle.kind())),
            Entry::Vacant(entry) => {
                log::debug!("Created {kind} collection '{name}' over {names:?}.");
                entry.insert(CollectionEntry {
                    handle: wrap(collection.clone()),
                    members: names,
                });
                Ok(collection)
            }
        }
    }

    // --- Lookup ---

    /// Get a registered counter or counter collection
    pub fn get_counter(&self, name: &str) -> MetricsResult<Arc<dyn Counter>> {
        self.lookup(
            name,
            MetricKind::Counter,
            |handle| match handle {
                MetricHandle::Counter(counter) => Some(counter.clone() as Arc<dyn Counter>),
                _ => None,
            },
            |handle| match handle {
                CollectionHandle::Counter(collection) => {
                    Some(collection.clone() as Arc<dyn Counter>)
                }
                _ => None,
            },
        )
    }

    /// Get a registered meter or meter collection
    pub fn get_meter(&self, name: &str) -> MetricsResult<Arc<dyn Meter>> {
        self.lookup(
            name,
            MetricKind::Meter,
            |handle| match handle {
                MetricHandle::Meter(meter) => Some(meter.clone() as Arc<dyn Meter>),
                _ => None,
            },
            |handle| match handle {
                CollectionHandle::Meter(collection) => Some(collection.clone() as Arc<dyn Meter>),
                _ => None,
            },
        )
    }

    /// Get a registered histogram or histogram collection
    pub fn get_histogram(&self, name: &str) -> MetricsResult<Arc<dyn Histogram>> {
        self.lookup(
            name,
            MetricKind::Histogram,
            |handle| match handle {
                MetricHandle::Histogram(histogram) => {
                    Some(histogram.clone() as Arc<dyn Histogram>)
                }
                _ => None,
            },
            |handle| match handle {
                CollectionHandle::Histogram(collection) => {
                    Some(collection.clone() as Arc<dyn Histogram>)
                }
                _ => None,
            },
        )
    }

    /// Get a registered timer or timer collection
    pub fn get_timer(&self, name: &str) -> MetricsResult<Arc<dyn Timer>> {
        self.lookup(
            name,
            MetricKind::Timer,
            |handle| match handle {
                MetricHandle::Timer(timer) => Some(timer.clone() as Arc<dyn Timer>),
                _ => None,
            },
            |handle| match handle {
                CollectionHandle::Timer(collection) => Some(collection.clone() as Arc<dyn Timer>),
                _ => None,
            },
        )
    }

    /// Get a registered gauge, cached or not
    pub fn get_gauge(&self, name: &str) -> MetricsResult<Arc<dyn Gauge>> {
        self.lookup(
            name,
            MetricKind::Gauge,
            |handle| match handle {
                MetricHandle::Gauge(gauge) => Some(gauge.clone() as Arc<dyn Gauge>),
                MetricHandle::CachedGauge(gauge) => Some(gauge.clone() as Arc<dyn Gauge>),
                _ => None,
            },
            |_| None,
        )
    }

    fn lookup<T: ?Sized>(
        &self,
        name: &str,
        kind: MetricKind,
        from_record: impl Fn(&MetricHandle) -> Option<Arc<T>>,
        from_collection: impl Fn(&CollectionHandle) -> Option<Arc<T>>,
    ) -> MetricsResult<Arc<T>> {
        if let Some(handle) = self.read_records().get(name) {
            return from_record(handle).ok_or_else(|| type_mismatch(name, kind, handle.kind()));
        }
        if let Some(entry) = self.read_collections().get(name) {
            return from_collection(&entry.handle)
                .ok_or_else(|| type_mismatch(name, kind, entry.handle.kind()));
        }
        Err(MetricsError::MetricNotFound(name.to_string()))
    }

    // --- Removal ---

    /// Remove a metric or, for an annotated name, a collection and every
    /// metric of its hierarchy.
    ///
    /// Returns whether anything was removed. Removing a plain metric also
    /// drops the collections that update it.
    pub fn remove(&self, name: &str) -> MetricsResult<bool> {
        if !is_annotated(name) {
            return Ok(self.remove_metric(name));
        }
        let names = hierarchy_names(name)?;
        let mut removed = self.write_collections().remove(name).is_some();
        for member in &names {
            removed |= self.remove_metric(member);
        }
        if removed {
            log::debug!("Removed collection '{name}'.");
        }
        Ok(removed)
    }

    fn remove_metric(&self, name: &str) -> bool {
        if self.write_records().remove(name).is_none() {
            return false;
        }
        self.backend.remove_metric(name);
        self.write_collections()
            .retain(|_, entry| !entry.members.iter().any(|member| member == name));
        log::debug!("Removed metric '{name}'.");
        true
    }

    // --- Counts ---

    /// Get the number of registered metrics
    pub fn metrics_count(&self) -> usize {
        self.read_records().len()
    }

    /// Get the number of registered metrics that are currently enabled
    pub fn enabled_metrics_count(&self) -> usize {
        self.read_records()
            .values()
            .filter(|handle| handle.state().is_enabled())
            .count()
    }

    /// Get the number of registered collections
    pub fn collections_count(&self) -> usize {
        self.read_collections().len()
    }

    // --- Enablement and levels ---

    /// Whether metrics are globally enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enable metrics
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Disable metrics. Every metric stops recording regardless of levels.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    fn set_enabled(&self, enabled: bool) {
        {
            let _admin = self.lock_admin();
            if self.enabled.swap(enabled, Ordering::AcqRel) == enabled {
                return;
            }
            log::info!("Metrics {}.", if enabled { "enabled" } else { "disabled" });
            self.refresh_enablement();
        }
        for listener in self.enabled_listeners.snapshot() {
            listener(enabled);
        }
    }

    /// Returns the cached enabled status of a registered metric
    pub fn is_metric_enabled(&self, name: &str) -> MetricsResult<bool> {
        self.read_records()
            .get(name)
            .map(|handle| handle.state().is_enabled())
            .ok_or_else(|| MetricsError::MetricNotFound(name.to_string()))
    }

    /// Get the root level
    pub fn root_level(&self) -> Level {
        self.levels.root_level()
    }

    /// Set the root level
    pub fn set_root_level(&self, level: Level) {
        let old = {
            let _admin = self.lock_admin();
            let old = self.levels.set_root_level(level);
            if old == level {
                return;
            }
            log::debug!("Root level changed from {old} to {level}.");
            self.refresh_enablement();
            old
        };
        for listener in self.root_level_listeners.snapshot() {
            listener(old, level);
        }
    }

    /// Get the level configured for a registered metric, if any
    pub fn metric_level(&self, name: &str) -> MetricsResult<Option<Level>> {
        if !self.read_records().contains_key(name) {
            return Err(MetricsError::MetricNotFound(name.to_string()));
        }
        Ok(self.levels.level(name))
    }

    /// Configure the level of a registered metric
    pub fn set_metric_level(&self, name: &str, level: Level) -> MetricsResult<()> {
        let old = {
            let _admin = self.lock_admin();
            if !self.read_records().contains_key(name) {
                return Err(MetricsError::MetricNotFound(name.to_string()));
            }
            let old = self.levels.set_level(name, level);
            if old == Some(level) {
                return Ok(());
            }
            log::debug!("Level of '{name}' changed from {old:?} to {level}.");
            self.refresh_enablement();
            old
        };
        for listener in self.metric_level_listeners.snapshot() {
            listener(name, old, level);
        }
        Ok(())
    }

    /// Recomputes the cached enabled flag of every record. Callers hold the
    /// admin lock so refreshes never interleave.
    fn refresh_enablement(&self) {
        let globally_enabled = self.is_enabled();
        for (name, handle) in self.read_records().iter() {
            let state = handle.state();
            state.set_enabled(self.levels.is_enabled(name, state.level(), globally_enabled));
        }
    }

    /// A filter accepting the names of registered, enabled metrics.
    ///
    /// The filter does not keep the registry alive.
    pub fn enabled_filter(&self) -> MetricFilter {
        let records = Arc::clone(&self.records);
        Arc::new(move |name: &str| {
            records
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .is_some_and(|handle| handle.state().is_enabled())
        })
    }

    // --- Listeners ---

    /// Register a listener for global enabled status changes
    pub fn add_enabled_status_listener(
        &self,
        listener: impl Fn(bool) + Send + Sync + 'static,
    ) -> ListenerId {
        self.enabled_listeners.add(Arc::new(listener))
    }

    /// Remove an enabled status listener
    pub fn remove_enabled_status_listener(&self, id: ListenerId) -> bool {
        self.enabled_listeners.remove(id)
    }

    /// Register a listener for root level changes
    pub fn add_root_level_listener(
        &self,
        listener: impl Fn(Level, Level) + Send + Sync + 'static,
    ) -> ListenerId {
        self.root_level_listeners.add(Arc::new(listener))
    }

    /// Remove a root level listener
    pub fn remove_root_level_listener(&self, id: ListenerId) -> bool {
        self.root_level_listeners.remove(id)
    }

    /// Register a listener for metric level changes
    pub fn add_metric_level_listener(
        &self,
        listener: impl Fn(&str, Option<Level>, Level) + Send + Sync + 'static,
    ) -> ListenerId {
        self.metric_level_listeners.add(Arc::new(listener))
    }

    /// Remove a metric level listener
    pub fn remove_metric_level_listener(&self, id: ListenerId) -> bool {
        self.metric_level_listeners.remove(id)
    }

    fn lock_admin(&self) -> MutexGuard<'_, ()> {
        self.admin.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_records(&self) -> RwLockReadGuard<'_, RecordMap> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, RecordMap> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_collections(&self) -> RwLockReadGuard<'_, HashMap<String, CollectionEntry>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_collections(&self) -> RwLockWriteGuard<'_, HashMap<String, CollectionEntry>> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("enabled", &self.is_enabled())
            .field("root_level", &self.root_level())
            .field("metrics", &self.metrics_count())
            .field("collections", &self.collections_count())
            .finish_non_exhaustive()
    }
}

fn levels_of(level: Level, ancestors: &[Level]) -> Vec<Level> {
    std::iter::once(level)
        .chain(ancestors.iter().copied())
        .collect()
}

fn type_mismatch(name: &str, expected: MetricKind, found: MetricKind) -> MetricsError {
    MetricsError::TypeMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}

fn existing<T: ?Sized>(
    name: &str,
    handle: &MetricHandle,
    level: Level,
    kind: MetricKind,
    extract: &impl Fn(&MetricHandle) -> Option<Arc<T>>,
) -> MetricsResult<Arc<T>> {
    let metric = extract(handle).ok_or_else(|| type_mismatch(name, kind, handle.kind()))?;
    let registered = handle.state().level();
    if registered != level {
        return Err(MetricsError::LevelMismatch {
            name: name.to_string(),
            registered,
            requested: level,
        });
    }
    Ok(metric)
}

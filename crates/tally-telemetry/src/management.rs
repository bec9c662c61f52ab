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

//! Runtime management of metrics and reporters.

use crate::metrics::{ListenerId, MetricsRegistry};
use crate::reporter::{Reporter, ReporterBuilder, ReporterError, ReporterKind};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tally_core::{Level, MetricsResult};

type ReporterMap = BTreeMap<String, Box<dyn Reporter>>;

/// Manages the enabled status, the levels and the reporters of a registry.
///
/// Reporters follow the registry: they are started when metrics are enabled
/// and stopped when they are disabled. On every level change, running
/// listening reporters are restarted so they pick up the new set of enabled
/// metrics. Scheduled reporters read the cached enablement on each cycle and
/// are left alone.
pub struct MetricManagementService {
    registry: Arc<MetricsRegistry>,
    reporters: Arc<Mutex<ReporterMap>>,
    enabled_listener: ListenerId,
    root_level_listener: ListenerId,
    metric_level_listener: ListenerId,
}

impl MetricManagementService {
    /// Creates the service and subscribes it to the registry's changes.
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        let reporters: Arc<Mutex<ReporterMap>> = Arc::new(Mutex::new(BTreeMap::new()));

        let weak = Arc::downgrade(&reporters);
        let enabled_listener = registry.add_enabled_status_listener(move |enabled| {
            with_reporters(&weak, |reporters| {
                if enabled {
                    start_all(reporters);
                } else {
                    stop_all(reporters);
                }
            });
        });

        let weak = Arc::downgrade(&reporters);
        let root_level_listener = registry.add_root_level_listener(move |_, _| {
            with_reporters(&weak, restart_listening);
        });

        let weak = Arc::downgrade(&reporters);
        let metric_level_listener = registry.add_metric_level_listener(move |_, _, _| {
            with_reporters(&weak, restart_listening);
        });

        Self {
            registry,
            reporters,
            enabled_listener,
            root_level_listener,
            metric_level_listener,
        }
    }

    /// The managed registry.
    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    // --- Metrics ---

    /// Whether metrics are globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.registry.is_enabled()
    }

    /// Enables metrics and starts every reporter.
    pub fn enable(&self) {
        self.registry.enable();
    }

    /// Disables metrics and stops every reporter.
    pub fn disable(&self) {
        self.registry.disable();
    }

    /// The root level.
    pub fn root_level(&self) -> Level {
        self.registry.root_level()
    }

    /// Sets the root level.
    pub fn set_root_level(&self, level: Level) {
        self.registry.set_root_level(level);
    }

    /// The level configured for a registered metric, if any.
    pub fn metric_level(&self, name: &str) -> MetricsResult<Option<Level>> {
        self.registry.metric_level(name)
    }

    /// Sets the level of a registered metric.
    pub fn set_metric_level(&self, name: &str, level: Level) -> MetricsResult<()> {
        self.registry.set_metric_level(name, level)
    }

    /// The number of registered metrics.
    pub fn metrics_count(&self) -> usize {
        self.registry.metrics_count()
    }

    /// The number of registered metrics that are currently enabled.
    pub fn enabled_metrics_count(&self) -> usize {
        self.registry.enabled_metrics_count()
    }

    /// The number of cached metric collections.
    pub fn collections_count(&self) -> usize {
        self.registry.collections_count()
    }

    // --- Reporters ---

    /// Builds a reporter from `builder` and registers it.
    ///
    /// # Errors
    ///
    /// Whatever the builder returns, including [`ReporterError::Disabled`]
    /// for a disabled configuration.
    pub fn add_reporter(&self, builder: &dyn ReporterBuilder) -> Result<(), ReporterError> {
        let reporter = builder.build(
            Arc::clone(self.registry.backend()),
            self.registry.enabled_filter(),
        )?;
        self.register_reporter(reporter);
        Ok(())
    }

    /// Registers a reporter, replacing (and stopping) any reporter with the
    /// same name. The reporter is started right away when metrics are
    /// enabled; a failed start is logged and retried on the next enable.
    pub fn register_reporter(&self, reporter: Box<dyn Reporter>) {
        let name = reporter.name().to_string();
        let mut reporters = self.lock_reporters();
        if let Some(mut replaced) = reporters.insert(name.clone(), reporter) {
            log::debug!("Replacing reporter '{}'.", name);
            if let Err(e) = replaced.stop() {
                log::error!("Failed to stop replaced reporter '{}': {}", name, e);
            }
        }
        if !self.registry.is_enabled() {
            return;
        }
        if let Some(reporter) = reporters.get_mut(&name) {
            if let Err(e) = reporter.start() {
                log::error!("Failed to start reporter '{}': {}", name, e);
            }
        }
    }

    /// Stops and removes a reporter. Returns `false` if none had that name.
    pub fn remove_reporter(&self, name: &str) -> bool {
        let removed = self.lock_reporters().remove(name);
        match removed {
            Some(mut reporter) => {
                if let Err(e) = reporter.stop() {
                    log::error!("Failed to stop reporter '{}': {}", name, e);
                }
                true
            }
            None => false,
        }
    }

    /// The names of the registered reporters, sorted.
    pub fn reporter_names(&self) -> Vec<String> {
        self.lock_reporters().keys().cloned().collect()
    }

    /// Runs one report cycle on every scheduled reporter. Failures are logged.
    pub fn report(&self) {
        for reporter in self.lock_reporters().values() {
            if reporter.kind() != ReporterKind::Scheduled {
                continue;
            }
            if let Err(e) = reporter.report() {
                log::error!("Reporter '{}' failed to report: {}", reporter.name(), e);
            }
        }
    }

    /// Runs one report cycle on the named reporter.
    pub fn report_reporter(&self, name: &str) -> Result<(), ReporterError> {
        self.lock_reporters()
            .get(name)
            .ok_or_else(|| ReporterError::NotFound(name.to_string()))?
            .report()
    }

    /// Starts the named reporter.
    pub fn start_reporter(&self, name: &str) -> Result<(), ReporterError> {
        self.lock_reporters()
            .get_mut(name)
            .ok_or_else(|| ReporterError::NotFound(name.to_string()))?
            .start()
    }

    /// Stops the named reporter.
    pub fn stop_reporter(&self, name: &str) -> Result<(), ReporterError> {
        self.lock_reporters()
            .get_mut(name)
            .ok_or_else(|| ReporterError::NotFound(name.to_string()))?
            .stop()
    }

    /// Whether the named reporter is running.
    pub fn is_reporter_running(&self, name: &str) -> Result<bool, ReporterError> {
        self.lock_reporters()
            .get(name)
            .map(|reporter| reporter.is_running())
            .ok_or_else(|| ReporterError::NotFound(name.to_string()))
    }

    /// Starts every reporter. Failures are logged.
    pub fn start_reporters(&self) {
        start_all(&mut self.lock_reporters());
    }

    /// Stops every reporter. Failures are logged.
    pub fn stop_reporters(&self) {
        stop_all(&mut self.lock_reporters());
    }

    fn lock_reporters(&self) -> MutexGuard<'_, ReporterMap> {
        self.reporters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MetricManagementService {
    fn drop(&mut self) {
        self.registry
            .remove_enabled_status_listener(self.enabled_listener);
        self.registry
            .remove_root_level_listener(self.root_level_listener);
        self.registry
            .remove_metric_level_listener(self.metric_level_listener);
        self.stop_reporters();
    }
}

impl std::fmt::Debug for MetricManagementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricManagementService")
            .field("registry", &self.registry)
            .field("reporters", &self.reporter_names())
            .finish()
    }
}

fn with_reporters(reporters: &Weak<Mutex<ReporterMap>>, f: impl FnOnce(&mut ReporterMap)) {
    if let Some(reporters) = reporters.upgrade() {
        f(&mut reporters.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

fn start_all(reporters: &mut ReporterMap) {
    for (name, reporter) in reporters.iter_mut() {
        if let Err(e) = reporter.start() {
            log::error!("Failed to start reporter '{}': {}", name, e);
        }
    }
}

fn stop_all(reporters: &mut ReporterMap) {
    for (name, reporter) in reporters.iter_mut() {
        if let Err(e) = reporter.stop() {
            log::error!("Failed to stop reporter '{}': {}", name, e);
        }
    }
}

fn restart_listening(reporters: &mut ReporterMap) {
    for (name, reporter) in reporters.iter_mut() {
        if reporter.kind() != ReporterKind::Listening || !reporter.is_running() {
            continue;
        }
        log::debug!("Restarting listening reporter '{}'.", name);
        if let Err(e) = reporter.stop().and_then(|()| reporter.start()) {
            log::error!("Failed to restart reporter '{}': {}", name, e);
        }
    }
}

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

//! The composition root of the metrics runtime.

use crate::config::MetricsConfig;
use crate::management::MetricManagementService;
use crate::metrics::MetricsRegistry;
use crate::reporter::ReporterError;
use crate::storage::InMemoryBackend;
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<MetricsService> = OnceLock::new();

/// Owns the registry and its management service, built from a
/// [`MetricsConfig`].
///
/// The service is created inactive: metrics are disabled and no reporter
/// runs until [`MetricsService::activate`] is called.
#[derive(Debug)]
pub struct MetricsService {
    config: MetricsConfig,
    management: MetricManagementService,
}

impl MetricsService {
    /// Builds the registry and the configured reporters.
    ///
    /// Disabled reporters are skipped.
    ///
    /// # Errors
    ///
    /// The first reporter that fails to build.
    pub fn new(config: MetricsConfig) -> Result<Self, ReporterError> {
        let registry = Arc::new(MetricsRegistry::configured(
            Arc::new(InMemoryBackend::new()),
            config.levels.to_level_configuration(),
            config.reservoir,
            false,
        ));
        let management = MetricManagementService::new(registry);
        for builder in config.reporting.builders() {
            match management.add_reporter(builder) {
                Ok(()) => {}
                Err(ReporterError::Disabled(name)) => {
                    log::debug!("Reporter '{}' is disabled.", name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self { config, management })
    }

    /// Loads the configuration file, applies environment overrides and
    /// builds the service.
    pub fn from_config_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config = MetricsConfig::load(path)?;
        config
            .apply_env_overrides()
            .context("Invalid metrics environment override")?;
        Ok(Self::new(config)?)
    }

    /// Enables metrics if the configuration says so, which starts the
    /// reporters.
    pub fn activate(&self) {
        if self.config.enabled {
            self.management.enable();
        } else {
            log::info!("Metrics are disabled in the configuration.");
        }
    }

    /// Disables metrics and stops the reporters.
    pub fn deactivate(&self) {
        self.management.disable();
    }

    /// The configuration the service was built from.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// The metric registry.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        self.management.registry()
    }

    /// The management service.
    pub fn management(&self) -> &MetricManagementService {
        &self.management
    }
}

/// Installs the process-wide service.
///
/// Returns the service back if one was already installed.
pub fn install_global(service: MetricsService) -> Result<(), MetricsService> {
    GLOBAL.set(service)?;
    log::info!("Process-wide metrics service installed.");
    Ok(())
}

/// The process-wide service, if installed.
pub fn global() -> Option<&'static MetricsService> {
    GLOBAL.get()
}

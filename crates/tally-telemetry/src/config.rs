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

//! Configuration model of the metrics service.
//!
//! A [`MetricsConfig`] is read once, from RON or JSON text, optionally
//! adjusted by environment overrides, and then handed to
//! [`MetricsService::new`](crate::service::MetricsService::new). Every field
//! has a default, so an empty document is a valid configuration:
//!
//! ```
//! use tally_telemetry::config::MetricsConfig;
//!
//! let config = MetricsConfig::from_ron_str("(levels: (root_level: \"DEBUG\"))").unwrap();
//! assert!(config.enabled);
//! assert_eq!(config.levels.root_level, tally_core::Level::Debug);
//! ```

use crate::metrics::LevelConfiguration;
use crate::reporter::{
    ConsoleReporterConfig, CsvReporterConfig, LogReporterConfig, ReporterBuilder,
};
use crate::stats::Reservoir;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tally_core::{Level, MetricsError, MetricsResult};

/// Override key for [`MetricsConfig::enabled`].
pub const ENABLED_KEY: &str = "TALLY_METRICS_ENABLED";

/// Override key for the root level.
pub const ROOT_LEVEL_KEY: &str = "TALLY_METRICS_ROOT_LEVEL";

/// Errors raised while parsing configuration text.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The RON document is malformed.
    #[error("invalid RON configuration: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// The JSON document is malformed.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// The root of the metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics are collected once the service is activated.
    pub enabled: bool,
    /// Root and per-name levels.
    pub levels: LevelsConfig,
    /// Reservoir used by new histograms and timers.
    pub reservoir: ReservoirConfig,
    /// Reporter configurations.
    pub reporting: ReportingConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            levels: LevelsConfig::default(),
            reservoir: ReservoirConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

/// The configured levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// The level of names with no configured ancestor.
    pub root_level: Level,
    /// Levels by metric name or name prefix.
    pub levels: BTreeMap<String, Level>,
}

impl LevelsConfig {
    /// Builds the runtime level store.
    pub fn to_level_configuration(&self) -> LevelConfiguration {
        LevelConfiguration::with_levels(
            self.root_level,
            self.levels
                .iter()
                .map(|(name, level)| (name.clone(), *level)),
        )
    }
}

/// The sampling strategy of histogram reservoirs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservoirKind {
    /// Keeps the last `window_size` values.
    #[default]
    SlidingWindow,
    /// Keeps the values of the last `window_secs` seconds.
    SlidingTimeWindow,
}

/// Reservoir settings for histograms and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// The sampling strategy.
    pub kind: ReservoirKind,
    /// Number of values kept by a sliding window.
    pub window_size: usize,
    /// Length of a sliding time window, in seconds.
    pub window_secs: u64,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            kind: ReservoirKind::SlidingWindow,
            window_size: 1028,
            window_secs: 60,
        }
    }
}

impl ReservoirConfig {
    /// Creates an empty reservoir with these settings.
    pub fn build(&self) -> Reservoir {
        match self.kind {
            ReservoirKind::SlidingWindow => Reservoir::sliding_window(self.window_size),
            ReservoirKind::SlidingTimeWindow => {
                Reservoir::sliding_time_window(Duration::from_secs(self.window_secs.max(1)))
            }
        }
    }
}

/// The built-in reporters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Console reporter.
    pub console: ConsoleReporterConfig,
    /// Log reporter.
    pub log: LogReporterConfig,
    /// CSV reporter.
    pub csv: CsvReporterConfig,
}

impl ReportingConfig {
    /// All reporter builders, enabled or not.
    pub fn builders(&self) -> Vec<&dyn ReporterBuilder> {
        vec![&self.console, &self.log, &self.csv]
    }
}

impl MetricsConfig {
    /// Parses a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Renders the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty)
    }

    /// Reads a configuration file. Files ending in `.json` are parsed as JSON,
    /// anything else as RON.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics configuration {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_ron_str(&text)
        };
        let config = config
            .with_context(|| format!("Failed to parse metrics configuration {}", path.display()))?;
        log::debug!("Loaded metrics configuration from {}.", path.display());
        Ok(config)
    }

    /// Applies overrides looked up by key.
    ///
    /// [`ENABLED_KEY`] accepts `true` or `false`, [`ROOT_LEVEL_KEY`] a level
    /// name. Both are case-insensitive; absent keys leave the value unchanged.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> MetricsResult<()> {
        if let Some(value) = lookup(ENABLED_KEY) {
            self.enabled = match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(MetricsError::InvalidArgument(format!(
                        "{ENABLED_KEY} must be true or false, got '{value}'"
                    )))
                }
            };
            log::debug!("Metrics enabled overridden to {}.", self.enabled);
        }
        if let Some(value) = lookup(ROOT_LEVEL_KEY) {
            self.levels.root_level = value.parse()?;
            log::debug!("Root level overridden to {}.", self.levels.root_level);
        }
        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> MetricsResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }
}

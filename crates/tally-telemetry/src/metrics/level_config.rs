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

//! Level configuration and the enablement resolver.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tally_core::telemetry::name::parent_name;
use tally_core::telemetry::Level;

/// Configured levels per metric name, plus the root level.
///
/// A name without an entry inherits the level of its closest configured
/// ancestor, or the root level when no ancestor is configured.
#[derive(Debug)]
pub struct LevelConfiguration {
    root: RwLock<Level>,
    levels: RwLock<HashMap<String, Level>>,
}

impl LevelConfiguration {
    /// Creates a configuration with only a root level.
    pub fn new(root: Level) -> Self {
        Self::with_levels(root, std::iter::empty())
    }

    /// Creates a configuration with a root level and explicit levels.
    pub fn with_levels(root: Level, levels: impl IntoIterator<Item = (String, Level)>) -> Self {
        Self {
            root: RwLock::new(root),
            levels: RwLock::new(levels.into_iter().collect()),
        }
    }

    /// Returns the root level.
    pub fn root_level(&self) -> Level {
        *self.root.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the root level and returns the previous one.
    pub fn set_root_level(&self, level: Level) -> Level {
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *root, level)
    }

    /// Returns the level explicitly configured for `name`.
    pub fn level(&self, name: &str) -> Option<Level> {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Configures the level of `name` and returns the previously configured one.
    pub fn set_level(&self, name: &str, level: Level) -> Option<Level> {
        self.levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), level)
    }

    /// Returns the level that applies to `name`: its own entry, the entry of
    /// its closest configured ancestor, or the root level.
    pub fn effective_level(&self, name: &str) -> Level {
        let levels = self.levels.read().unwrap_or_else(PoisonError::into_inner);
        let mut current = Some(name);
        while let Some(candidate) = current {
            if let Some(level) = levels.get(candidate) {
                return *level;
            }
            current = parent_name(candidate);
        }
        drop(levels);
        self.root_level()
    }

    /// Decides whether a metric created with `metric_level` is enabled.
    pub fn is_enabled(&self, name: &str, metric_level: Level, globally_enabled: bool) -> bool {
        globally_enabled && is_level_enabled(self.effective_level(name), metric_level)
    }
}

impl Default for LevelConfiguration {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

/// A metric is collected when the configured level is at least as broad as
/// the metric level. `Off` never enables anything, even an `Off` metric.
pub fn is_level_enabled(configured: Level, metric_level: Level) -> bool {
    configured > Level::Off && configured >= metric_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_level_applies_without_entries() {
        let config = LevelConfiguration::new(Level::Info);
        assert!(config.is_enabled("a.b.count", Level::Info, true));
        assert!(!config.is_enabled("a.b.count", Level::Debug, true));
    }

    #[test]
    fn test_closest_ancestor_wins() {
        let config = LevelConfiguration::with_levels(
            Level::Info,
            [
                ("a".to_string(), Level::Trace),
                ("a.b".to_string(), Level::Off),
            ],
        );
        assert_eq!(config.effective_level("a.b.c.count"), Level::Off);
        assert_eq!(config.effective_level("a.x.count"), Level::Trace);
        assert_eq!(config.effective_level("z.count"), Level::Info);
        assert!(!config.is_enabled("a.b.count", Level::Info, true));
        assert!(config.is_enabled("a.x.count", Level::Trace, true));
    }

    #[test]
    fn test_off_never_enables() {
        let config = LevelConfiguration::new(Level::Off);
        assert!(!config.is_enabled("a.count", Level::Off, true));
        assert!(!is_level_enabled(Level::Off, Level::Off));
        assert!(is_level_enabled(Level::Info, Level::Off));
    }

    #[test]
    fn test_global_disable_wins() {
        let config = LevelConfiguration::new(Level::All);
        assert!(!config.is_enabled("a.count", Level::Info, false));
    }

    #[test]
    fn test_enablement_is_monotonic_in_metric_level() {
        for configured in Level::VALUES {
            let config = LevelConfiguration::new(configured);
            for (index, higher) in Level::VALUES.iter().enumerate() {
                if config.is_enabled("a.count", *higher, true) {
                    for lower in &Level::VALUES[..=index] {
                        assert!(config.is_enabled("a.count", *lower, true));
                    }
                }
            }
        }
    }

    #[test]
    fn test_setters_return_previous_values() {
        let config = LevelConfiguration::default();
        assert_eq!(config.set_root_level(Level::Debug), Level::Info);
        assert_eq!(config.root_level(), Level::Debug);
        assert_eq!(config.set_level("a.b", Level::Trace), None);
        assert_eq!(config.set_level("a.b", Level::All), Some(Level::Trace));
        assert_eq!(config.level("a.b"), Some(Level::All));
        assert_eq!(config.level("a"), None);
    }
}

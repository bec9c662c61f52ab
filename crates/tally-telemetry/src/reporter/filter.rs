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

//! Include/exclude name filters for reporters.

use super::ReporterError;
use crate::metrics::MetricFilter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Restricts the metrics a reporter exports by name.
///
/// A metric is reported when it is enabled, matches no exclude and matches
/// an include (an empty include set matches everything). Without regex
/// filters names are compared for equality; with them every expression must
/// match the whole name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameFilterConfig {
    /// Treat includes and excludes as regular expressions.
    pub use_regex_filters: bool,
    /// Names (or expressions) to report.
    pub includes: BTreeSet<String>,
    /// Names (or expressions) never to report.
    pub excludes: BTreeSet<String>,
}

enum Matcher {
    Exact(BTreeSet<String>),
    Regex(Vec<Regex>),
}

impl Matcher {
    fn is_empty(&self) -> bool {
        match self {
            Matcher::Exact(names) => names.is_empty(),
            Matcher::Regex(patterns) => patterns.is_empty(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Exact(names) => names.contains(name),
            Matcher::Regex(patterns) => patterns.iter().any(|pattern| pattern.is_match(name)),
        }
    }
}

impl NameFilterConfig {
    /// Combines these rules with the registry's `enabled` filter.
    ///
    /// # Errors
    ///
    /// [`ReporterError::Build`] if a regular expression does not compile.
    pub fn build(&self, reporter: &str, enabled: MetricFilter) -> Result<MetricFilter, ReporterError> {
        if self.includes.is_empty() && self.excludes.is_empty() {
            return Ok(enabled);
        }
        let includes = self.matcher(reporter, &self.includes)?;
        let excludes = self.matcher(reporter, &self.excludes)?;
        Ok(Arc::new(move |name: &str| {
            enabled(name)
                && !excludes.matches(name)
                && (includes.is_empty() || includes.matches(name))
        }))
    }

    fn matcher(&self, reporter: &str, expressions: &BTreeSet<String>) -> Result<Matcher, ReporterError> {
        if !self.use_regex_filters {
            return Ok(Matcher::Exact(expressions.clone()));
        }
        expressions
            .iter()
            .map(|expression| {
                Regex::new(&format!("^(?:{expression})$")).map_err(|err| ReporterError::Build {
                    name: reporter.to_string(),
                    reason: format!("invalid filter expression '{expression}': {err}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Matcher::Regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_all() -> MetricFilter {
        Arc::new(|_: &str| true)
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_empty_rules_keep_enabled_filter() {
        let filter = NameFilterConfig::default()
            .build("test", Arc::new(|name: &str| name == "a"))
            .unwrap();
        assert!(filter("a"));
        assert!(!filter("b"));
    }

    #[test]
    fn test_exact_includes_and_excludes() {
        let config = NameFilterConfig {
            use_regex_filters: false,
            includes: set(&["a.count", "b.count"]),
            excludes: set(&["b.count"]),
        };
        let filter = config.build("test", allow_all()).unwrap();
        assert!(filter("a.count"));
        assert!(!filter("b.count"));
        assert!(!filter("c.count"));
    }

    #[test]
    fn test_regex_filters_match_whole_name() {
        let config = NameFilterConfig {
            use_regex_filters: true,
            includes: set(&[r"org\.app\..*"]),
            excludes: set(&[r".*\.debug"]),
        };
        let filter = config.build("test", allow_all()).unwrap();
        assert!(filter("org.app.count"));
        assert!(!filter("org.app.debug"));
        assert!(!filter("x.org.app.count"));
    }

    #[test]
    fn test_disabled_metrics_stay_filtered() {
        let config = NameFilterConfig {
            excludes: set(&["b"]),
            ..Default::default()
        };
        let filter = config.build("test", Arc::new(|_: &str| false)).unwrap();
        assert!(!filter("a"));
    }

    #[test]
    fn test_invalid_regex_is_a_build_error() {
        let config = NameFilterConfig {
            use_regex_filters: true,
            includes: set(&["("]),
            ..Default::default()
        };
        assert!(matches!(
            config.build("test", allow_all()),
            Err(ReporterError::Build { .. })
        ));
    }
}

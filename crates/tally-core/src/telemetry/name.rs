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

//! Metric name grammar.
//!
//! Metric names are dot-delimited paths such as `org.app.db.query.time`. The
//! last segment is the statistic name and the segments before it form the
//! path of the metric. Any path segment may carry the `[+]` marker
//! (`org.app[+].db.query.time`): the update is then also applied to the
//! ancestor metric rooted at that prefix (`org.app.time`).

use super::metrics::{MetricsError, MetricsResult};

/// The marker appended to a segment to make it an aggregation point.
pub const ANNOTATION: &str = "[+]";

/// The separator between name segments.
pub const SEPARATOR: char = '.';

/// Returns the segment without its `[+]` marker, or `None` if the segment is
/// not annotated. A bare `[+]` has no name to strip to and is not annotated.
fn strip_annotation(segment: &str) -> Option<&str> {
    segment
        .strip_suffix(ANNOTATION)
        .filter(|stripped| !stripped.is_empty())
}

/// Returns `true` if any segment of `name` carries the `[+]` marker.
pub fn is_annotated(name: &str) -> bool {
    name.split(SEPARATOR)
        .any(|segment| strip_annotation(segment).is_some())
}

/// Expands an annotated name into the ordered list of plain metric names it
/// updates.
///
/// Element 0 is the fully qualified name with every marker removed. It is
/// followed by one name per annotated segment, least specific first:
///
/// ```
/// use tally_core::telemetry::name::hierarchy_names;
///
/// let names = hierarchy_names("a[+].b[+].c.stat").unwrap();
/// assert_eq!(names, ["a.b.c.stat", "a.stat", "a.b.stat"]);
/// ```
///
/// # Errors
///
/// Returns [`MetricsError::InvalidName`] if the name has fewer than three
/// segments or if either of its last two segments is annotated.
pub fn hierarchy_names(name: &str) -> MetricsResult<Vec<String>> {
    let segments: Vec<&str> = name.split(SEPARATOR).collect();
    if segments.len() < 3 {
        return Err(MetricsError::InvalidName {
            name: name.to_string(),
            reason: "an annotated name needs at least three segments".to_string(),
        });
    }

    let (statistic, path) = segments
        .split_last()
        .ok_or_else(|| MetricsError::InvalidName {
            name: name.to_string(),
            reason: "empty name".to_string(),
        })?;
    let leaf = path.last().copied().unwrap_or_default();
    if strip_annotation(statistic).is_some() || strip_annotation(leaf).is_some() {
        return Err(MetricsError::InvalidName {
            name: name.to_string(),
            reason: "the last two segments cannot be annotated".to_string(),
        });
    }

    // Slot 0 is filled once the whole path is known.
    let mut names = vec![String::new()];
    let mut parent = String::with_capacity(name.len());
    for segment in path {
        let (plain, annotated) = match strip_annotation(segment) {
            Some(stripped) => (stripped, true),
            None => (*segment, false),
        };
        if !parent.is_empty() {
            parent.push(SEPARATOR);
        }
        parent.push_str(plain);
        if annotated {
            names.push(format!("{parent}{SEPARATOR}{statistic}"));
        }
    }
    names[0] = format!("{parent}{SEPARATOR}{statistic}");
    Ok(names)
}

/// Returns the name of the parent of `name`, or `None` for a single segment.
pub fn parent_name(name: &str) -> Option<&str> {
    name.rfind(SEPARATOR).map(|index| &name[..index])
}

/// Joins the non-empty parts into a dotted metric name.
///
/// ```
/// use tally_core::telemetry::name::name;
///
/// assert_eq!(name("org.app", &["", "requests", "count"]), "org.app.requests.count");
/// ```
pub fn name(first: &str, rest: &[&str]) -> String {
    std::iter::once(first)
        .chain(rest.iter().copied())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds the name of a metric attached to a method of some scope
/// (a module or a type).
///
/// An explicit absolute name is used as is. An explicit relative name is
/// appended to `scope.method`. Without an explicit name the metric is named
/// `scope.method`.
pub fn scoped_name(explicit: Option<&str>, absolute: bool, scope: &str, method: &str) -> String {
    match explicit.filter(|explicit| !explicit.is_empty()) {
        Some(explicit) if absolute => explicit.to_string(),
        Some(explicit) => name(scope, &[method, explicit]),
        None => name(scope, &[method]),
    }
}

/// Converts a Rust module path (`a::b::c`) into a dotted metric prefix.
pub fn module_scope(module_path: &str) -> String {
    module_path.replace("::", ".")
}

/// Builds a metric name prefixed with the calling module's path.
///
/// ```
/// use tally_core::metric_name;
///
/// let name = metric_name!("requests", "count");
/// assert!(name.ends_with(".requests.count"));
/// ```
#[macro_export]
macro_rules! metric_name {
    ($($part:expr),* $(,)?) => {
        $crate::telemetry::name::name(
            &$crate::telemetry::name::module_scope(module_path!()),
            &[$($part),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_annotated() {
        assert!(is_annotated("org.wso2[+].main.count"));
        assert!(is_annotated("a[+].b[+].c.stat"));
        assert!(!is_annotated("org.wso2.main.count"));
        assert!(!is_annotated("org.[+].main.count"));
        assert!(!is_annotated("org.wso2[+]x.main.count"));
    }

    #[test]
    fn test_hierarchy_single_marker() {
        let names = hierarchy_names("org.wso2.main2[+].sub.throughput").unwrap();
        assert_eq!(
            names,
            ["org.wso2.main2.sub.throughput", "org.wso2.main2.throughput"]
        );
    }

    #[test]
    fn test_hierarchy_multiple_markers() {
        let names = hierarchy_names("org[+].wso2[+].main[+].sub.count").unwrap();
        assert_eq!(
            names,
            [
                "org.wso2.main.sub.count",
                "org.count",
                "org.wso2.count",
                "org.wso2.main.count"
            ]
        );
    }

    #[test]
    fn test_hierarchy_without_marker_yields_main_only() {
        let names = hierarchy_names("org.wso2.count").unwrap();
        assert_eq!(names, ["org.wso2.count"]);
    }

    #[test]
    fn test_hierarchy_rejects_short_names() {
        assert!(matches!(
            hierarchy_names("a[+].stat"),
            Err(MetricsError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_hierarchy_rejects_annotated_tail() {
        assert!(matches!(
            hierarchy_names("a.b[+].stat"),
            Err(MetricsError::InvalidName { .. })
        ));
        assert!(matches!(
            hierarchy_names("a.b.stat[+]"),
            Err(MetricsError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_hierarchy_size_matches_marker_count() {
        for (name, markers) in [
            ("a[+].b.c.d", 1),
            ("a[+].b[+].c.d", 2),
            ("a.b[+].c[+].d.e", 2),
        ] {
            assert_eq!(hierarchy_names(name).unwrap().len(), markers + 1);
        }
    }

    #[test]
    fn test_parent_name() {
        assert_eq!(parent_name("a.b.c"), Some("a.b"));
        assert_eq!(parent_name("a.b"), Some("a"));
        assert_eq!(parent_name("a"), None);
    }

    #[test]
    fn test_name_skips_empty_parts() {
        assert_eq!(name("a", &[]), "a");
        assert_eq!(name("", &["b", "", "c"]), "b.c");
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(scoped_name(None, false, "app.Svc", "call"), "app.Svc.call");
        assert_eq!(
            scoped_name(Some("hits"), false, "app.Svc", "call"),
            "app.Svc.call.hits"
        );
        assert_eq!(scoped_name(Some("hits"), true, "app.Svc", "call"), "hits");
        assert_eq!(scoped_name(Some(""), true, "app.Svc", "call"), "app.Svc.call");
    }

    #[test]
    fn test_metric_name_macro_uses_module_path() {
        let name = crate::metric_name!("requests");
        assert_eq!(name, "tally_core.telemetry.name.tests.requests");
    }
}

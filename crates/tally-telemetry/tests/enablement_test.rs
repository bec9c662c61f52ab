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

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tally_core::telemetry::{Counter, Meter, MetricsError};
use tally_core::Level;
use tally_telemetry::metrics::LevelConfiguration;
use tally_telemetry::MetricsRegistry;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_root_off_stops_counting() -> Result<()> {
    init_logging();
    let registry = MetricsRegistry::new();
    let counter = registry.counter("org.app.requests", Level::Info, &[])?;
    counter.inc();

    registry.set_root_level(Level::Off);
    counter.inc();
    assert_eq!(counter.count(), 1);
    assert!(!registry.is_metric_enabled("org.app.requests")?);

    registry.set_root_level(Level::Info);
    counter.inc();
    assert_eq!(counter.count(), 2);
    Ok(())
}

#[test]
fn test_level_sequence_on_one_metric() -> Result<()> {
    init_logging();
    let registry = MetricsRegistry::new();
    let meter = registry.meter("org.app.debug.events", Level::Debug, &[])?;

    // INFO root: a DEBUG metric is off.
    meter.mark();
    assert_eq!(meter.count(), 0);

    registry.set_metric_level("org.app.debug.events", Level::Trace)?;
    meter.mark();
    assert_eq!(meter.count(), 1);

    registry.set_metric_level("org.app.debug.events", Level::Info)?;
    meter.mark();
    assert_eq!(meter.count(), 1);

    registry.set_metric_level("org.app.debug.events", Level::Debug)?;
    meter.mark();
    assert_eq!(meter.count(), 2);
    assert_eq!(registry.metric_level("org.app.debug.events")?, Some(Level::Debug));
    Ok(())
}

#[test]
fn test_sibling_level_does_not_affect_unrelated_metric() -> Result<()> {
    init_logging();
    let registry = MetricsRegistry::new();
    let left = registry.counter("org.app.left.count", Level::Info, &[])?;
    registry.counter("org.app.right.count", Level::Info, &[])?;

    for level in Level::VALUES {
        registry.set_metric_level("org.app.right.count", level)?;
        assert!(registry.is_metric_enabled("org.app.left.count")?);
    }
    left.inc();
    assert_eq!(left.count(), 1);
    Ok(())
}

#[test]
fn test_configured_prefix_levels_are_inherited() -> Result<()> {
    init_logging();
    let levels = LevelConfiguration::with_levels(
        Level::Off,
        [
            ("org.app".to_string(), Level::Trace),
            ("org.app.quiet".to_string(), Level::Off),
        ],
    );
    let registry = MetricsRegistry::configured(
        Arc::new(tally_telemetry::storage::InMemoryBackend::new()),
        levels,
        Default::default(),
        true,
    );

    let deep = registry.counter("org.app.db.pool.active", Level::Trace, &[])?;
    let quiet = registry.counter("org.app.quiet.count", Level::Info, &[])?;
    let outside = registry.counter("org.other.count", Level::Info, &[])?;
    deep.inc();
    quiet.inc();
    outside.inc();
    assert_eq!((deep.count(), quiet.count(), outside.count()), (1, 0, 0));
    assert_eq!(registry.enabled_metrics_count(), 1);
    Ok(())
}

#[test]
fn test_global_disable_overrides_every_level() -> Result<()> {
    init_logging();
    let registry = MetricsRegistry::new();
    registry.set_root_level(Level::All);
    let names = ["a.b.one", "a.b.two", "c.d.three"];
    for name in names {
        registry.counter(name, Level::Info, &[])?;
    }
    registry.set_metric_level("a.b.one", Level::All)?;

    registry.disable();
    for name in names {
        assert!(!registry.is_metric_enabled(name)?);
    }
    assert_eq!(registry.enabled_metrics_count(), 0);

    registry.enable();
    assert_eq!(registry.enabled_metrics_count(), 3);
    Ok(())
}

#[test]
fn test_listeners_observe_changes_in_order() -> Result<()> {
    init_logging();
    let registry = Arc::new(MetricsRegistry::new());
    let events = Arc::new(Mutex::new(Vec::<String>::new()));

    let log = Arc::clone(&events);
    registry.add_enabled_status_listener(move |enabled| {
        log.lock().unwrap().push(format!("enabled {enabled}"));
    });
    let log = Arc::clone(&events);
    registry.add_root_level_listener(move |old, new| {
        log.lock().unwrap().push(format!("root {old} -> {new}"));
    });
    let log = Arc::clone(&events);
    let observer = Arc::clone(&registry);
    registry.add_metric_level_listener(move |name, old, new| {
        // The cache is already recomputed when listeners run.
        let enabled = observer.is_metric_enabled(name).unwrap();
        log.lock()
            .unwrap()
            .push(format!("{name} {old:?} -> {new} ({enabled})"));
    });

    registry.counter("org.app.count", Level::Debug, &[])?;
    registry.set_root_level(Level::Info);
    registry.set_root_level(Level::Debug);
    registry.set_metric_level("org.app.count", Level::Off)?;
    registry.disable();
    registry.disable();

    assert_eq!(
        *events.lock().unwrap(),
        [
            "root INFO -> DEBUG",
            "org.app.count None -> OFF (false)",
            "enabled false",
        ]
    );
    Ok(())
}

#[test]
fn test_unknown_metric_level() {
    init_logging();
    let registry = MetricsRegistry::new();
    assert!(matches!(
        registry.set_metric_level("org.app.missing", Level::Debug),
        Err(MetricsError::MetricNotFound(_))
    ));
    assert!(matches!(
        registry.is_metric_enabled("org.app.missing"),
        Err(MetricsError::MetricNotFound(_))
    ));
}

#[test]
fn test_kind_and_level_conflicts() -> Result<()> {
    init_logging();
    let registry = MetricsRegistry::new();
    let first = registry.counter("org.app.hits", Level::Info, &[])?;
    let again = registry.counter("org.app.hits", Level::Info, &[])?;
    first.inc();
    assert_eq!(again.count(), 1);

    assert!(matches!(
        registry.meter("org.app.hits", Level::Info, &[]),
        Err(MetricsError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.counter("org.app.hits", Level::Debug, &[]),
        Err(MetricsError::LevelMismatch { .. })
    ));
    Ok(())
}

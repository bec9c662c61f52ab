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
use std::collections::BTreeSet;
use std::fs;
use tally_core::telemetry::{Counter, Gauge};
use tally_core::Level;
use tally_telemetry::config::MetricsConfig;
use tally_telemetry::reporter::csv::metric_file;
use tally_telemetry::reporter::{ConsoleReporterConfig, NameFilterConfig};
use tally_telemetry::{MetricsService, ReporterBuilder};
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_csv_reporter_from_configuration() -> Result<()> {
    init_logging();
    let dir = tempdir()?;
    let location = dir.path().join("csv");
    let text = format!(
        r#"(
            levels: (root_level: "DEBUG"),
            reporting: (
                csv: (
                    enabled: true,
                    polling_period: 3600,
                    location: Some({:?}),
                    filter: (excludes: ["org.app.secret"]),
                ),
            ),
        )"#,
        location.display().to_string()
    );
    let service = MetricsService::new(MetricsConfig::from_ron_str(&text)?)?;
    service.activate();

    let metrics = service.metrics();
    metrics.counter("org.app.requests", Level::Debug, &[])?.inc_by(3);
    metrics.counter("org.app.secret", Level::Info, &[])?.inc();
    metrics.counter("org.app.verbose", Level::Trace, &[])?.inc();
    metrics.gauge("org.app.ratio", Level::Info, || 0.25)?;

    service.management().report_reporter("CSV")?;

    let requests = fs::read_to_string(metric_file(&location, "org.app.requests"))?;
    assert_eq!(requests.lines().next(), Some("t,count"));
    assert!(requests.lines().nth(1).is_some_and(|row| row.ends_with(",3")));

    let ratio = fs::read_to_string(metric_file(&location, "org.app.ratio"))?;
    assert!(ratio.lines().nth(1).is_some_and(|row| row.ends_with(",0.25")));

    // Excluded by name, and disabled by level.
    assert!(!metric_file(&location, "org.app.secret").exists());
    assert!(!metric_file(&location, "org.app.verbose").exists());

    service.deactivate();
    assert!(!service.management().is_reporter_running("CSV")?);
    Ok(())
}

#[test]
fn test_regex_filter_selects_metrics() -> Result<()> {
    init_logging();
    let dir = tempdir()?;
    let mut config = MetricsConfig::default();
    config.reporting.csv.enabled = true;
    config.reporting.csv.location = Some(dir.path().to_path_buf());
    config.reporting.csv.filter = NameFilterConfig {
        use_regex_filters: true,
        includes: BTreeSet::from(["org\\.db\\..*".to_string()]),
        excludes: BTreeSet::from([".*\\.internal\\..*".to_string()]),
    };
    let service = MetricsService::new(config)?;
    service.activate();

    for name in ["org.db.queries", "org.db.internal.locks", "org.web.requests"] {
        service.metrics().counter(name, Level::Info, &[])?.inc();
    }
    service.management().report();

    let mut written: Vec<String> = fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    written.sort();
    assert_eq!(written, ["org.db.queries.csv"]);
    Ok(())
}

#[test]
fn test_console_reporter_writes_enabled_metrics() -> Result<()> {
    init_logging();
    let service = MetricsService::new(MetricsConfig::default())?;
    service.activate();
    service.metrics().counter("org.app.hits", Level::Info, &[])?.inc_by(2);
    service.metrics().cached_gauge(
        "org.app.load",
        Level::Info,
        std::time::Duration::from_secs(60),
        || 1.5,
    )?;
    assert_eq!(service.metrics().get_gauge("org.app.load")?.value(), 1.5);

    let buffer = tempfile::NamedTempFile::new()?;
    let config = ConsoleReporterConfig {
        enabled: true,
        ..Default::default()
    };
    let reporter = config.build_with_writer(
        std::sync::Arc::clone(service.metrics().backend()),
        service.metrics().enabled_filter(),
        buffer.reopen()?,
    )?;
    assert_eq!(config.reporter_name(), "Console");
    reporter.report()?;

    let output = fs::read_to_string(buffer.path())?;
    assert!(output.contains("(2 metrics)"));
    assert!(output.contains("org.app.hits"));
    assert!(output.contains("           count = 2"));
    assert!(output.contains("           value = 1.5"));
    Ok(())
}

#[test]
fn test_config_file_with_env_style_overrides() -> Result<()> {
    init_logging();
    let dir = tempdir()?;
    let path = dir.path().join("metrics.json");
    fs::write(&path, r#"{"enabled": true, "levels": {"root_level": "INFO"}}"#)?;

    let mut config = MetricsConfig::load(&path)?;
    config.apply_overrides(|key| match key {
        "TALLY_METRICS_ENABLED" => Some("false".to_string()),
        "TALLY_METRICS_ROOT_LEVEL" => Some("all".to_string()),
        _ => None,
    })?;
    let service = MetricsService::new(config)?;
    service.activate();
    assert!(!service.metrics().is_enabled());
    assert_eq!(service.metrics().root_level(), Level::All);
    Ok(())
}

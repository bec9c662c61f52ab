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

//! Reports appended to one CSV file per metric.

use super::console::{polling_period, unix_timestamp};
use super::filter::NameFilterConfig;
use super::scheduled::{ReportSink, ScheduledReporter};
use super::{Reporter, ReporterBuilder, ReporterError};
use crate::metrics::MetricFilter;
use crate::storage::{DistributionSample, MetricSample, MetricsBackend, RateSample, SampleValue};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration of the CSV reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvReporterConfig {
    /// The reporter name.
    pub name: String,
    /// Whether the reporter is built at all.
    pub enabled: bool,
    /// Seconds between two reports.
    pub polling_period: u64,
    /// Name filters.
    pub filter: NameFilterConfig,
    /// The directory the files are written to. Required.
    pub location: Option<PathBuf>,
}

impl Default for CsvReporterConfig {
    fn default() -> Self {
        Self {
            name: "CSV".to_string(),
            enabled: false,
            polling_period: 60,
            filter: NameFilterConfig::default(),
            location: None,
        }
    }
}

impl ReporterBuilder for CsvReporterConfig {
    fn reporter_name(&self) -> &str {
        &self.name
    }

    fn build(
        &self,
        backend: Arc<dyn MetricsBackend>,
        filter: MetricFilter,
    ) -> Result<Box<dyn Reporter>, ReporterError> {
        if !self.enabled {
            return Err(ReporterError::Disabled(self.name.clone()));
        }
        let location = match &self.location {
            Some(location) if !location.as_os_str().is_empty() => location.clone(),
            _ => {
                return Err(ReporterError::Build {
                    name: self.name.clone(),
                    reason: "the CSV reporting location is not specified".to_string(),
                })
            }
        };
        let period = polling_period(&self.name, self.polling_period)?;
        let filter = self.filter.build(&self.name, filter)?;

        if !location.exists() {
            fs::create_dir_all(&location).map_err(|source| ReporterError::Io {
                name: self.name.clone(),
                source,
            })?;
        }
        if !location.is_dir() {
            return Err(ReporterError::Build {
                name: self.name.clone(),
                reason: format!("{} is not a directory", location.display()),
            });
        }

        log::info!(
            "Creating CSV reporter '{}' writing to {} every {} seconds.",
            self.name,
            location.display(),
            self.polling_period
        );
        Ok(Box::new(ScheduledReporter::new(
            self.name.clone(),
            period,
            backend,
            filter,
            CsvSink { directory: location },
        )))
    }
}

struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    fn append(&self, sample: &MetricSample, timestamp: u64) -> io::Result<()> {
        let (header, row) = columns(&sample.value);
        let path = metric_file(&self.directory, &sample.name);
        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if fresh {
            writeln!(file, "t,{header}")?;
        }
        writeln!(file, "{timestamp},{row}")
    }
}

impl ReportSink for CsvSink {
    fn write(&mut self, reporter: &str, samples: &[MetricSample]) -> Result<(), ReporterError> {
        let timestamp = unix_timestamp();
        for sample in samples {
            self.append(sample, timestamp)
                .map_err(|source| ReporterError::Io {
                    name: reporter.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

const RATE_COLUMNS: &str = "mean_rate,m1_rate,m5_rate,m15_rate";
const DISTRIBUTION_COLUMNS: &str = "max,mean,min,stddev,p50,p75,p95,p98,p99,p999";

/// Returns the header and the row, without the timestamp column.
fn columns(value: &SampleValue) -> (String, String) {
    match value {
        SampleValue::Counter { count } => ("count".to_string(), count.to_string()),
        SampleValue::Gauge { value } => ("value".to_string(), value.to_string()),
        SampleValue::Meter { count, rates } => (
            format!("count,{RATE_COLUMNS}"),
            format!("{count},{}", rate_row(rates)),
        ),
        SampleValue::Histogram {
            count,
            distribution,
        } => (
            format!("count,{DISTRIBUTION_COLUMNS}"),
            format!("{count},{}", distribution_row(distribution)),
        ),
        SampleValue::Timer {
            count,
            rates,
            distribution,
        } => (
            format!("count,{DISTRIBUTION_COLUMNS},{RATE_COLUMNS}"),
            format!(
                "{count},{},{}",
                distribution_row(distribution),
                rate_row(rates)
            ),
        ),
    }
}

fn rate_row(r: &RateSample) -> String {
    format!("{},{},{},{}", r.mean_rate, r.m1_rate, r.m5_rate, r.m15_rate)
}

fn distribution_row(d: &DistributionSample) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{}",
        d.max, d.mean, d.min, d.std_dev, d.median, d.p75, d.p95, d.p98, d.p99, d.p999
    )
}

/// Returns the file the reporter writes for `metric` under `directory`.
///
/// Characters outside `[A-Za-z0-9._-]` are replaced with `_` so the file
/// always lands directly inside `directory`.
pub fn metric_file(directory: &Path, metric: &str) -> PathBuf {
    let file_name: String = metric
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    directory.join(format!("{file_name}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsRegistry;
    use tally_core::telemetry::{Counter, Level, Meter};

    fn enabled_config(location: &Path) -> CsvReporterConfig {
        CsvReporterConfig {
            enabled: true,
            location: Some(location.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_location_is_rejected() {
        let registry = MetricsRegistry::new();
        let config = CsvReporterConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(matches!(
            config.build(registry.backend().clone(), registry.enabled_filter()),
            Err(ReporterError::Build { .. })
        ));
    }

    #[test]
    fn test_location_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();
        let registry = MetricsRegistry::new();
        assert!(matches!(
            enabled_config(&file).build(registry.backend().clone(), registry.enabled_filter()),
            Err(ReporterError::Build { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let registry = MetricsRegistry::new();
        enabled_config(&nested)
            .build(registry.backend().clone(), registry.enabled_filter())
            .unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_report_appends_one_row_per_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let registry = MetricsRegistry::new();
        let counter = registry.counter("org.app.requests", Level::Info, &[]).unwrap();
        let meter = registry.meter("org.app.events", Level::Info, &[]).unwrap();
        counter.inc_by(7);
        meter.mark();

        let reporter = enabled_config(dir.path())
            .build(registry.backend().clone(), registry.enabled_filter())
            .unwrap();
        reporter.report().unwrap();
        reporter.report().unwrap();

        let content = fs::read_to_string(metric_file(dir.path(), "org.app.requests")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "t,count");
        assert!(lines[1].ends_with(",7"));

        let content = fs::read_to_string(metric_file(dir.path(), "org.app.events")).unwrap();
        assert!(content.starts_with("t,count,mean_rate,m1_rate,m5_rate,m15_rate\n"));
    }

    #[test]
    fn test_metric_names_cannot_leave_the_location() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("csv");
        assert_eq!(
            metric_file(&dir, "../escape/x").parent(),
            Some(dir.as_path())
        );
        assert_eq!(
            metric_file(&dir, r"a\b:c").file_name().unwrap(),
            "a_b_c.csv"
        );

        let registry = MetricsRegistry::new();
        registry.counter("org/../../escape", Level::Info, &[]).unwrap().inc();
        let reporter = enabled_config(&dir)
            .build(registry.backend().clone(), registry.enabled_filter())
            .unwrap();
        reporter.report().unwrap();

        let written: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(written, ["org_.._.._escape.csv"]);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }
}

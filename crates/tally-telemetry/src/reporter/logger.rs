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

//! Reports written through the `log` facade.

use super::console::polling_period;
use super::filter::NameFilterConfig;
use super::scheduled::{ReportSink, ScheduledReporter};
use super::{Reporter, ReporterBuilder, ReporterError};
use crate::metrics::MetricFilter;
use crate::storage::{DistributionSample, MetricSample, MetricsBackend, RateSample, SampleValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How each metric is rendered in its log record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// `type=COUNTER, name=a.b, count=1`
    #[default]
    Text,
    /// One JSON object per metric.
    Json,
}

/// Configuration of the log reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogReporterConfig {
    /// The reporter name.
    pub name: String,
    /// Whether the reporter is built at all.
    pub enabled: bool,
    /// Seconds between two reports.
    pub polling_period: u64,
    /// Name filters.
    pub filter: NameFilterConfig,
    /// The log target records are emitted under.
    pub target: String,
    /// The record format.
    pub format: LogFormat,
}

impl Default for LogReporterConfig {
    fn default() -> Self {
        Self {
            name: "Log".to_string(),
            enabled: false,
            polling_period: 60,
            filter: NameFilterConfig::default(),
            target: "metrics".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl ReporterBuilder for LogReporterConfig {
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
        if self.target.trim().is_empty() {
            return Err(ReporterError::Build {
                name: self.name.clone(),
                reason: "the log target is not specified".to_string(),
            });
        }
        let period = polling_period(&self.name, self.polling_period)?;
        let filter = self.filter.build(&self.name, filter)?;
        log::info!(
            "Creating log reporter '{}' with target '{}' and a {} seconds polling period.",
            self.name,
            self.target,
            self.polling_period
        );
        Ok(Box::new(ScheduledReporter::new(
            self.name.clone(),
            period,
            backend,
            filter,
            LogSink {
                target: self.target.clone(),
                format: self.format,
            },
        )))
    }
}

struct LogSink {
    target: String,
    format: LogFormat,
}

impl ReportSink for LogSink {
    fn write(&mut self, reporter: &str, samples: &[MetricSample]) -> Result<(), ReporterError> {
        for sample in samples {
            let line = format_sample(sample, self.format).map_err(|e| ReporterError::Report {
                name: reporter.to_string(),
                reason: e.to_string(),
            })?;
            log::info!(target: self.target.as_str(), "{}", line);
        }
        Ok(())
    }
}

/// Renders one sample as a log line.
pub fn format_sample(sample: &MetricSample, format: LogFormat) -> serde_json::Result<String> {
    match format {
        LogFormat::Json => serde_json::to_string(sample),
        LogFormat::Text => Ok(format_text(sample)),
    }
}

fn format_text(sample: &MetricSample) -> String {
    let name = &sample.name;
    match &sample.value {
        SampleValue::Counter { count } => format!("type=COUNTER, name={name}, count={count}"),
        SampleValue::Gauge { value } => format!("type=GAUGE, name={name}, value={value}"),
        SampleValue::Meter { count, rates } => {
            format!("type=METER, name={name}, count={count}, {}", rate_fields(rates))
        }
        SampleValue::Histogram {
            count,
            distribution,
        } => format!(
            "type=HISTOGRAM, name={name}, count={count}, {}",
            distribution_fields(distribution)
        ),
        SampleValue::Timer {
            count,
            rates,
            distribution,
        } => format!(
            "type=TIMER, name={name}, count={count}, {}, {}",
            distribution_fields(distribution),
            rate_fields(rates)
        ),
    }
}

fn rate_fields(rates: &RateSample) -> String {
    format!(
        "mean_rate={}, m1={}, m5={}, m15={}, rate_unit=events/second",
        rates.mean_rate, rates.m1_rate, rates.m5_rate, rates.m15_rate
    )
}

fn distribution_fields(d: &DistributionSample) -> String {
    format!(
        "min={}, max={}, mean={}, stddev={}, median={}, p75={}, p95={}, p98={}, p99={}, p999={}",
        d.min, d.max, d.mean, d.std_dev, d.median, d.p75, d.p95, d.p98, d.p99, d.p999
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsRegistry;

    fn sample(value: SampleValue) -> MetricSample {
        MetricSample {
            name: "org.app.count".to_string(),
            value,
        }
    }

    #[test]
    fn test_text_format() {
        let line = format_sample(&sample(SampleValue::Counter { count: 4 }), LogFormat::Text).unwrap();
        assert_eq!(line, "type=COUNTER, name=org.app.count, count=4");
        let line = format_sample(&sample(SampleValue::Gauge { value: 0.5 }), LogFormat::Text).unwrap();
        assert_eq!(line, "type=GAUGE, name=org.app.count, value=0.5");
    }

    #[test]
    fn test_json_format() {
        let line = format_sample(&sample(SampleValue::Counter { count: 4 }), LogFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "counter");
        assert_eq!(value["count"], 4);
        assert_eq!(value["name"], "org.app.count");
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let registry = MetricsRegistry::new();
        let config = LogReporterConfig {
            enabled: true,
            target: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.build(registry.backend().clone(), registry.enabled_filter()),
            Err(ReporterError::Build { .. })
        ));
    }

    #[test]
    fn test_enabled_config_builds_stopped_reporter() {
        let registry = MetricsRegistry::new();
        let config = LogReporterConfig {
            enabled: true,
            format: LogFormat::Json,
            ..Default::default()
        };
        let reporter = config
            .build(registry.backend().clone(), registry.enabled_filter())
            .unwrap();
        assert_eq!(reporter.name(), "Log");
        assert!(!reporter.is_running());
        reporter.report().unwrap();
    }
}

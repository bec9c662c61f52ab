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

//! Human readable reports written to the console.

use super::filter::NameFilterConfig;
use super::scheduled::{ReportSink, ScheduledReporter};
use super::{Reporter, ReporterBuilder, ReporterError};
use crate::metrics::MetricFilter;
use crate::storage::{DistributionSample, MetricSample, MetricsBackend, RateSample, SampleValue};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration of the console reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleReporterConfig {
    /// The reporter name.
    pub name: String,
    /// Whether the reporter is built at all.
    pub enabled: bool,
    /// Seconds between two reports.
    pub polling_period: u64,
    /// Name filters.
    pub filter: NameFilterConfig,
}

impl Default for ConsoleReporterConfig {
    fn default() -> Self {
        Self {
            name: "Console".to_string(),
            enabled: false,
            polling_period: 60,
            filter: NameFilterConfig::default(),
        }
    }
}

impl ReporterBuilder for ConsoleReporterConfig {
    fn reporter_name(&self) -> &str {
        &self.name
    }

    fn build(
        &self,
        backend: Arc<dyn MetricsBackend>,
        filter: MetricFilter,
    ) -> Result<Box<dyn Reporter>, ReporterError> {
        self.build_with_writer(backend, filter, io::stdout())
    }
}

impl ConsoleReporterConfig {
    /// Builds the reporter writing to `out` instead of stdout.
    pub fn build_with_writer(
        &self,
        backend: Arc<dyn MetricsBackend>,
        filter: MetricFilter,
        out: impl Write + Send + 'static,
    ) -> Result<Box<dyn Reporter>, ReporterError> {
        if !self.enabled {
            return Err(ReporterError::Disabled(self.name.clone()));
        }
        let period = polling_period(&self.name, self.polling_period)?;
        let filter = self.filter.build(&self.name, filter)?;
        log::info!(
            "Creating console reporter '{}' with a {} seconds polling period.",
            self.name,
            self.polling_period
        );
        Ok(Box::new(ScheduledReporter::new(
            self.name.clone(),
            period,
            backend,
            filter,
            ConsoleSink::new(out),
        )))
    }
}

/// Validates a polling period given in seconds.
pub(crate) fn polling_period(reporter: &str, seconds: u64) -> Result<Duration, ReporterError> {
    if seconds == 0 {
        return Err(ReporterError::Build {
            name: reporter.to_string(),
            reason: "the polling period must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Writes every cycle as an aligned block of text.
pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
}

impl ConsoleSink {
    /// Creates a sink writing to `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    fn write_cycle(&mut self, samples: &[MetricSample]) -> io::Result<()> {
        writeln!(self.out, "-- metrics @ {} ({} metrics)", unix_timestamp(), samples.len())?;
        for sample in samples {
            writeln!(self.out, "{}", sample.name)?;
            match &sample.value {
                SampleValue::Counter { count } => self.field("count", count)?,
                SampleValue::Gauge { value } => self.field("value", value)?,
                SampleValue::Meter { count, rates } => {
                    self.field("count", count)?;
                    self.rates(rates)?;
                }
                SampleValue::Histogram {
                    count,
                    distribution,
                } => {
                    self.field("count", count)?;
                    self.distribution(distribution)?;
                }
                SampleValue::Timer {
                    count,
                    rates,
                    distribution,
                } => {
                    self.field("count", count)?;
                    self.rates(rates)?;
                    self.distribution(distribution)?;
                }
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn field(&mut self, label: &str, value: &dyn std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{label:>16} = {value}")
    }

    fn rates(&mut self, rates: &RateSample) -> io::Result<()> {
        self.field("mean rate", &format_args!("{:.2}/s", rates.mean_rate))?;
        self.field("1-minute rate", &format_args!("{:.2}/s", rates.m1_rate))?;
        self.field("5-minute rate", &format_args!("{:.2}/s", rates.m5_rate))?;
        self.field("15-minute rate", &format_args!("{:.2}/s", rates.m15_rate))
    }

    fn distribution(&mut self, d: &DistributionSample) -> io::Result<()> {
        self.field("min", &d.min)?;
        self.field("max", &d.max)?;
        self.field("mean", &format_args!("{:.2}", d.mean))?;
        self.field("stddev", &format_args!("{:.2}", d.std_dev))?;
        self.field("median", &format_args!("{:.2}", d.median))?;
        self.field("75%", &format_args!("{:.2}", d.p75))?;
        self.field("95%", &format_args!("{:.2}", d.p95))?;
        self.field("98%", &format_args!("{:.2}", d.p98))?;
        self.field("99%", &format_args!("{:.2}", d.p99))?;
        self.field("99.9%", &format_args!("{:.2}", d.p999))
    }
}

impl ReportSink for ConsoleSink {
    fn write(&mut self, reporter: &str, samples: &[MetricSample]) -> Result<(), ReporterError> {
        self.write_cycle(samples).map_err(|source| ReporterError::Io {
            name: reporter.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsRegistry;
    use std::sync::Mutex;
    use tally_core::telemetry::{Counter, Histogram, Level};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_disabled_config_is_not_built() {
        let registry = MetricsRegistry::new();
        let result = ConsoleReporterConfig::default()
            .build(registry.backend().clone(), registry.enabled_filter());
        assert!(matches!(result, Err(ReporterError::Disabled(name)) if name == "Console"));
    }

    #[test]
    fn test_zero_polling_period_is_rejected() {
        let registry = MetricsRegistry::new();
        let config = ConsoleReporterConfig {
            enabled: true,
            polling_period: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.build(registry.backend().clone(), registry.enabled_filter()),
            Err(ReporterError::Build { .. })
        ));
    }

    #[test]
    fn test_console_report_lists_enabled_metrics() {
        let registry = MetricsRegistry::new();
        registry
            .counter("org.app.requests", Level::Info, &[])
            .unwrap()
            .inc_by(7);
        registry.counter("org.app.hidden", Level::Trace, &[]).unwrap();
        registry
            .histogram("org.app.sizes", Level::Info, &[])
            .unwrap()
            .update(12);

        let buffer = SharedBuffer::default();
        let config = ConsoleReporterConfig {
            enabled: true,
            ..Default::default()
        };
        let reporter = config
            .build_with_writer(
                registry.backend().clone(),
                registry.enabled_filter(),
                buffer.clone(),
            )
            .unwrap();
        reporter.report().unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("(2 metrics)"));
        assert!(output.contains("org.app.requests\n           count = 7"));
        assert!(output.contains("org.app.sizes"));
        assert!(output.contains("             max = 12"));
        assert!(!output.contains("org.app.hidden"));
    }
}

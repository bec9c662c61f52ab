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

//! Reporters export metric values to external sinks.
//!
//! A [`Reporter`] is built from a [`ReporterBuilder`] (usually a reporter
//! configuration) with the backend to read from and the registry's enabled
//! filter. Scheduled reporters poll the backend on their own thread;
//! listening reporters subscribe to the live metric set and are restarted
//! when levels change.

pub mod console;
pub mod csv;
pub mod filter;
pub mod logger;
pub mod scheduled;

pub use console::ConsoleReporterConfig;
pub use csv::CsvReporterConfig;
pub use filter::NameFilterConfig;
pub use logger::{LogFormat, LogReporterConfig};
pub use scheduled::{ReportSink, ScheduledReporter};

use crate::metrics::MetricFilter;
use crate::storage::MetricsBackend;
use std::sync::Arc;

/// How a reporter gets its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    /// Polls the backend periodically. Supports on-demand [`Reporter::report`].
    Scheduled,
    /// Subscribes to the metric set while running. Restarted on level changes
    /// so it picks up the new enabled set.
    Listening,
}

/// Errors raised while building or driving reporters.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// The reporter configuration is incomplete or invalid.
    #[error("failed to build reporter '{name}': {reason}")]
    Build {
        /// The reporter name.
        name: String,
        /// What is wrong with the configuration.
        reason: String,
    },
    /// The reporter is disabled in its configuration.
    #[error("reporter '{0}' is disabled")]
    Disabled(String),
    /// No reporter is registered under the name.
    #[error("reporter '{0}' not found")]
    NotFound(String),
    /// Writing to the sink failed.
    #[error("reporter '{name}' failed to write: {source}")]
    Io {
        /// The reporter name.
        name: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The reporter could not produce its report.
    #[error("reporter '{name}' failed: {reason}")]
    Report {
        /// The reporter name.
        name: String,
        /// Why the report failed.
        reason: String,
    },
}

/// A sink-specific exporter of metric values.
pub trait Reporter: Send {
    /// The unique name of the reporter.
    fn name(&self) -> &str;

    /// Whether the reporter polls or listens.
    fn kind(&self) -> ReporterKind;

    /// Starts reporting. Starting a running reporter does nothing.
    fn start(&mut self) -> Result<(), ReporterError>;

    /// Stops reporting. Stopping a stopped reporter does nothing.
    fn stop(&mut self) -> Result<(), ReporterError>;

    /// Whether the reporter is started.
    fn is_running(&self) -> bool;

    /// Reports the current values once, on the calling thread.
    fn report(&self) -> Result<(), ReporterError>;
}

/// Builds a reporter reading from `backend` and honouring `filter`.
pub trait ReporterBuilder {
    /// The name of the reporter this builder produces.
    fn reporter_name(&self) -> &str;

    /// Builds the reporter.
    ///
    /// # Errors
    ///
    /// [`ReporterError::Disabled`] when the configuration is disabled and
    /// [`ReporterError::Build`] when it is incomplete.
    fn build(
        &self,
        backend: Arc<dyn MetricsBackend>,
        filter: MetricFilter,
    ) -> Result<Box<dyn Reporter>, ReporterError>;
}

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

//! Runtime shared by the polling reporters.

use super::{Reporter, ReporterError, ReporterKind};
use crate::metrics::MetricFilter;
use crate::storage::{MetricSample, MetricsBackend};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Writes one report cycle to an external sink.
pub trait ReportSink: Send + 'static {
    /// Writes the samples of one cycle, sorted by name.
    fn write(&mut self, reporter: &str, samples: &[MetricSample]) -> Result<(), ReporterError>;
}

struct Worker {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// A reporter that samples the backend every `period` on a dedicated thread.
pub struct ScheduledReporter {
    name: String,
    period: Duration,
    backend: Arc<dyn MetricsBackend>,
    filter: MetricFilter,
    sink: Arc<Mutex<dyn ReportSink>>,
    worker: Option<Worker>,
}

impl ScheduledReporter {
    /// Creates a stopped reporter.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        backend: Arc<dyn MetricsBackend>,
        filter: MetricFilter,
        sink: impl ReportSink,
    ) -> Self {
        Self {
            name: name.into(),
            period,
            backend,
            filter,
            sink: Arc::new(Mutex::new(sink)),
            worker: None,
        }
    }

    /// The time between two report cycles.
    pub fn period(&self) -> Duration {
        self.period
    }

    fn run_cycle(
        name: &str,
        backend: &dyn MetricsBackend,
        filter: &MetricFilter,
        sink: &Mutex<dyn ReportSink>,
    ) -> Result<(), ReporterError> {
        let samples = backend.samples(&|metric: &str| filter(metric));
        log::trace!("Reporter '{}' writing {} samples.", name, samples.len());
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(name, &samples)
    }
}

impl Reporter for ScheduledReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ReporterKind {
        ReporterKind::Scheduled
    }

    fn start(&mut self) -> Result<(), ReporterError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let name = self.name.clone();
        let period = self.period;
        let backend = self.backend.clone();
        let filter = self.filter.clone();
        let sink = self.sink.clone();

        let handle = thread::Builder::new()
            .name(format!("reporter-{}", self.name))
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = Self::run_cycle(&name, backend.as_ref(), &filter, &sink) {
                            log::error!("Reporter '{}' failed to report: {}", name, e);
                        }
                    }
                    // Stop requested or the reporter was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|source| ReporterError::Io {
                name: self.name.clone(),
                source,
            })?;

        self.worker = Some(Worker { stop_tx, handle });
        log::info!(
            "Reporter '{}' started with a {:?} polling period.",
            self.name,
            self.period
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ReporterError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.stop_tx.send(());
        worker.handle.join().map_err(|_| ReporterError::Report {
            name: self.name.clone(),
            reason: "reporter thread panicked".to_string(),
        })?;
        log::info!("Reporter '{}' stopped.", self.name);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn report(&self) -> Result<(), ReporterError> {
        Self::run_cycle(&self.name, self.backend.as_ref(), &self.filter, &self.sink)
    }
}

impl Drop for ScheduledReporter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("{}", e);
        }
    }
}

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

//! # Tally Telemetry
//!
//! The metrics runtime: a registry of level-gated counters, meters,
//! histograms, timers and gauges, fan-out collections for annotated
//! (`[+]`) names, and scheduled reporters exporting the enabled metrics.
//!
//! ```
//! use tally_core::telemetry::Counter;
//! use tally_core::Level;
//! use tally_telemetry::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new();
//! let sub = registry
//!     .counter("org.app[+].db.queries", Level::Info, &[Level::Info])
//!     .unwrap();
//! sub.inc_by(3);
//! assert_eq!(registry.get_counter("org.app.queries").unwrap().count(), 3);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod management;
pub mod metrics;
pub mod reporter;
pub mod service;
pub mod stats;
pub mod storage;
pub mod utils;

pub use config::MetricsConfig;
pub use management::MetricManagementService;
pub use metrics::{MetricCollection, MetricFilter, MetricsRegistry};
pub use reporter::{Reporter, ReporterBuilder, ReporterError, ReporterKind};
pub use service::MetricsService;
pub use utils::TimerExt;

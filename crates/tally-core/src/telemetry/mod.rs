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

//! Provides the foundational types and contracts for level-gated metrics.
//!
//! This module defines the "common language" of the metrics system: the
//! [`Level`] scale, the dotted metric name grammar and the instrument traits
//! every metric implements. `tally-telemetry` provides the registry that
//! creates, gates and reports the concrete instruments.

pub mod level;
pub mod metrics;
pub mod name;

pub use self::level::Level;
pub use self::metrics::{
    Counter, Gauge, Histogram, Meter, MetricKind, MetricsError, MetricsResult, Snapshot, Timer,
};

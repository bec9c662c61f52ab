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

//! Metric registration, level gating and fan-out.

pub mod collection;
pub mod instruments;
pub mod level_config;
pub mod listeners;
pub mod registry;

pub use collection::MetricCollection;
pub use level_config::LevelConfiguration;
pub use listeners::ListenerId;
pub use registry::{MetricFilter, MetricsRegistry};

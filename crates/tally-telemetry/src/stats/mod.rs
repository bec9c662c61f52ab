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

//! Thread-safe statistics storage.
//!
//! These types hold the raw values behind every metric. They know nothing
//! about names or levels: gating is applied by the instruments in
//! [`crate::metrics`], and reporters read the values back through the
//! [`crate::storage::MetricsBackend`].

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod timer;

pub use counter::CounterStat;
pub use gauge::{CachedGaugeStat, GaugeStat};
pub use histogram::{HistogramStat, Reservoir};
pub use meter::MeterStat;
pub use timer::TimerStat;

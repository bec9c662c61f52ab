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

//! Default in-process backend.

use crate::storage::backend::{MetricsBackend, StoredMetric};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory metrics backend using `RwLock<HashMap>`.
///
/// Reads (sampling, lookups) share the lock; only registration and removal
/// take it exclusively. Value updates never touch the lock since the stored
/// statistics are shared with their instruments.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<String, StoredMetric>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredMetric>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredMetric>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, name: &str, metric: StoredMetric) -> Option<StoredMetric> {
        self.write().insert(name.to_string(), metric)
    }

    fn get_metric(&self, name: &str) -> Option<StoredMetric> {
        self.read().get(name).cloned()
    }

    fn contains_metric(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    fn remove_metric(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    fn list_metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn clear_all(&self) {
        self.write().clear();
    }

    fn metric_count(&self) -> usize {
        self.read().len()
    }
}

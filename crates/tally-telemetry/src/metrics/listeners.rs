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

//! Change listeners.
//!
//! Listeners are called synchronously, in registration order, on the thread
//! that made the change. The list is copied before notifying so a listener
//! may register or remove listeners without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tally_core::telemetry::Level;

/// Called with the new global enabled status.
pub type EnabledStatusListener = dyn Fn(bool) + Send + Sync;

/// Called with the old and the new root level.
pub type RootLevelListener = dyn Fn(Level, Level) + Send + Sync;

/// Called with the metric name, the previously configured level (if any) and
/// the new level.
pub type MetricLevelListener = dyn Fn(&str, Option<Level>, Level) + Send + Sync;

/// Identifies a registered listener so it can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An ordered, thread-safe list of listeners.
pub struct ListenerList<F: ?Sized> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<F>)>>,
}

impl<F: ?Sized> ListenerList<F> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Appends a listener.
    pub fn add(&self, listener: Arc<F>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Removes a listener, returning whether it was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the registered listeners, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

impl<F: ?Sized> Default for ListenerList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for ListenerList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let list: ListenerList<EnabledStatusListener> = ListenerList::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let calls = calls.clone();
            list.add(Arc::new(move |enabled: bool| {
                calls.lock().unwrap().push((tag, enabled));
            }));
        }
        for listener in list.snapshot() {
            listener(true);
        }
        assert_eq!(*calls.lock().unwrap(), [("first", true), ("second", true)]);
    }

    #[test]
    fn test_remove_listener() {
        let list: ListenerList<RootLevelListener> = ListenerList::default();
        let id = list.add(Arc::new(|_, _| {}));
        list.add(Arc::new(|_, _| {}));
        assert_eq!(list.len(), 2);
        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert_eq!(list.len(), 1);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_listener_may_register_while_notified() {
        let list: Arc<ListenerList<EnabledStatusListener>> = Arc::new(ListenerList::new());
        let inner = list.clone();
        list.add(Arc::new(move |_| {
            inner.add(Arc::new(|_| {}));
        }));
        for listener in list.snapshot() {
            listener(false);
        }
        assert_eq!(list.len(), 2);
    }
}

//! Keyed debounce scheduler
//!
//! `schedule` delays a task until its key has been quiet for `delay`. A second
//! call under the same key aborts the pending timer before arming a new one, so
//! at most one call per key is ever waiting. Once the timer fires the task is
//! detached: rescheduling never aborts work that has already started, which is
//! why controllers guard their results with a request sequence number.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::util::lock;

struct Pending {
    /// Generation of the timer, so a firing timer only removes its own entry
    id: u64,
    handle: JoinHandle<()>,
}

/// Debounce scheduler with independent keys
pub struct Debouncer<K> {
    pending: Arc<Mutex<HashMap<K, Pending>>>,
    next_id: Arc<AtomicU64>,
}

impl<K> Clone for Debouncer<K> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `task` after `delay` unless `key` is rescheduled or cancelled first.
    ///
    /// A zero delay still goes through the runtime, never inline, so the call
    /// stays cancellable until the spawned timer is polled.
    pub fn schedule<F>(&self, key: K, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = self.pending.clone();
        let fired_key = key.clone();

        let mut slots = lock(&self.pending);
        if let Some(previous) = slots.remove(&key) {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut slots = lock(&pending);
                match slots.get(&fired_key) {
                    Some(entry) if entry.id == id => {
                        slots.remove(&fired_key);
                    }
                    // Superseded between wake-up and here
                    _ => return,
                }
            }

            tokio::spawn(task);
        });

        slots.insert(key, Pending { id, handle });
    }

    /// Cancel the pending call under `key`. Returns true if one was waiting.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.pending).remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a call is still waiting for its quiet period under `key`
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending)
            .get(key)
            .map(|entry| !entry.handle.is_finished())
            .unwrap_or(false)
    }
}

//! Deduplicating work queue with per-key serialization.
//!
//! A key is held at most once in the queue. While a worker processes a key,
//! re-adding it only marks it dirty; [`WorkQueue::done`] puts a dirty key
//! back. No key is ever handed to two workers at the same time.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use pokesync_core::ObjectKey;

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<ObjectKey>,
    queued: HashSet<ObjectKey>,
    processing: HashSet<ObjectKey>,
    dirty: HashSet<ObjectKey>,
    shutting_down: bool,
}

impl QueueState {
    fn push(&mut self, key: ObjectKey) -> bool {
        if self.queued.insert(key.clone()) {
            self.queue.push_back(key);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key. Keys already queued are not duplicated.
    pub async fn add(&self, key: ObjectKey) {
        let mut state = self.state.lock().await;
        if state.shutting_down {
            return;
        }
        if state.processing.contains(&key) {
            state.dirty.insert(key);
            return;
        }
        if state.push(key) {
            self.notify.notify_one();
        }
    }

    /// Adds a key once `delay` has elapsed.
    pub fn add_after(self: &Arc<Self>, key: ObjectKey, delay: Duration) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key).await;
        });
    }

    /// Waits for the next key and marks it as processing.
    ///
    /// Returns `None` once the queue has been shut down.
    pub async fn get(&self) -> Option<ObjectKey> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.queued.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
            }
            notified.await;
        }
    }

    /// Marks `key` as no longer processing, re-queueing it if it was re-added.
    pub async fn done(&self, key: &ObjectKey) {
        let mut state = self.state.lock().await;
        state.processing.remove(key);
        if state.dirty.remove(key) && !state.shutting_down && state.push(key.clone()) {
            self.notify.notify_one();
        }
    }

    /// Stops handing out keys and wakes every waiting worker.
    pub async fn shut_down(&self) {
        self.state.lock().await.shutting_down = true;
        self.notify.notify_waiters();
    }

    /// Number of keys waiting to be processed.
    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

//! Per-key async mutexes.
//!
//! Every read-modify-write in the services runs while holding the lock for
//! the record it mutates, so two requests touching the same cart, review or
//! product summary are applied one after the other inside this process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

/// Held lock on one key. Dropping it releases the mutex and removes the map
/// entry when nobody else holds or waits on it.
pub struct KeyGuard {
    key: Uuid,
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Entry and clone happen under the same shard lock, so a count of one
        // means no task holds or awaits this mutex.
        self.inner.remove_if(&self.key, |_, m| Arc::strong_count(m) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self { Self::default() }

    pub async fn lock(&self, key: Uuid) -> KeyGuard {
        let mutex = self.inner.entry(key).or_default().clone();
        let guard = mutex.lock_owned().await;
        KeyGuard { key, inner: self.inner.clone(), guard: Some(guard) }
    }

    pub fn len(&self) -> usize { self.inner.len() }
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

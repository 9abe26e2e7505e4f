//! Per-app mutual exclusion
//!
//! Workspace creation and the manifest patch are not safe to run twice at
//! the same time for one app, so every pipeline entry point holds the app's
//! lock for its whole duration. Different apps never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per app id
#[derive(Debug, Default)]
pub struct AppLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AppLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `app_id`
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn acquire(&self, app_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the map are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(app_id.to_string()).or_default())
        };

        lock.lock_owned().await
    }

    /// Number of apps with a held or awaited lock
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|l| Arc::strong_count(l) > 1).count()
    }
}

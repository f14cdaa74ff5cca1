//! Per-user ingest serialization
//!
//! Uploads from one user run one at a time so the retention trim always
//! sees the previous upload's result. Different users never wait on each
//! other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UserLocks {
    /// Wait for exclusive ingest rights for `user_id`. Released on drop.
    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // entries nobody holds or waits on
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl std::fmt::Debug for UserLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLocks").finish_non_exhaustive()
    }
}

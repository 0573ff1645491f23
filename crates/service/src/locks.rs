//! Per-complaint async locks
//!
//! Transitions on the same complaint run one at a time; different complaints
//! never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are swept once the registry grows past this size
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `complaint_id`
    pub async fn acquire(&self, complaint_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() >= SWEEP_THRESHOLD {
                // Only the registry holds an idle lock
                locks.retain(|_, l| Arc::strong_count(l) > 1);
            }
            locks.entry(complaint_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let registry = Arc::new(LockRegistry::new());
        let guard = registry.acquire("CMP-1").await;

        let r = registry.clone();
        let waiter = tokio::spawn(async move {
            let _g = r.acquire("CMP-1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let registry = LockRegistry::new();
        let _a = registry.acquire("CMP-1").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), registry.acquire("CMP-2"))
            .await
            .expect("independent ids must not contend");
        assert_eq!(registry.len(), 2);
    }
}

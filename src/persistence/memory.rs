//! In-memory durable store.
//!
//! Survives a cache restart within one process as long as a clone of the
//! handle is kept, which is what the warm-restart tests rely on.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::persistence::DurableStore;

/// Shared string map with an optional byte quota over keys and values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes pushing usage past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            data: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Number of keys held.
    pub async fn len(&self) -> usize {
        self.data.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.lock().await.is_empty()
    }

    /// Bytes used by keys and values.
    pub async fn used_bytes(&self) -> usize {
        let data = self.data.lock().await;
        usage(&*data)
    }
}

fn usage(data: &HashMap<String, String>) -> usize {
    data.iter().map(|(k, v)| k.len() + v.len()).sum()
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut data = self.data.lock().await;

        if let Some(quota) = self.quota {
            let replaced = data.get(key).map_or(0, |old| key.len() + old.len());
            let used = usage(&*data) - replaced;
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }

        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.data.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.data.lock().await.keys().cloned().collect())
    }
}

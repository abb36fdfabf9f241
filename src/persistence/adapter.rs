//! Persistence adapter.
//!
//! Scopes cache records under a namespace prefix, encodes them as JSON and
//! keeps every durable failure away from the in-memory cache.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, CacheEntry};
use crate::error::StorageError;
use crate::persistence::DurableStore;

// == Persisted Entry ==
/// On-disk form of an uncompressed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Serialized value as UTF-8 JSON text
    pub payload: String,
    pub created_at: u64,
    pub ttl_ms: u64,
    pub access_count: u64,
    pub last_access_at: u64,
}

impl PersistedEntry {
    fn from_entry(entry: &CacheEntry) -> Result<Self, StorageError> {
        let payload = std::str::from_utf8(&entry.payload)
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?
            .to_string();
        Ok(Self {
            payload,
            created_at: entry.created_at,
            ttl_ms: entry.ttl_ms,
            access_count: entry.access_count,
            last_access_at: entry.last_access_at,
        })
    }

    fn into_entry(self, key: &str) -> CacheEntry {
        let mut entry = CacheEntry::with_timestamp(
            key,
            self.payload.into_bytes(),
            Duration::from_millis(self.ttl_ms),
            false,
            self.created_at,
        );
        entry.access_count = self.access_count;
        entry.last_access_at = self.last_access_at;
        entry
    }

    fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) > self.ttl_ms
    }
}

// == Persistence Adapter ==
/// Namespaced, fail-soft view over a [`DurableStore`].
#[derive(Debug, Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn DurableStore>,
    namespace: String,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn DurableStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Lists the cache keys (prefix stripped) held in the durable store.
    ///
    /// The bare namespace is skipped: cache keys are never empty.
    async fn namespace_keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.store.list_keys().await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
            .filter(|k| !k.is_empty())
            .collect())
    }

    async fn read_record(&self, key: &str) -> Result<Option<PersistedEntry>, StorageError> {
        match self.store.get(&self.namespaced(key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // == Warm Load ==
    /// Reads every live record under the namespace.
    ///
    /// Expired and unreadable records are removed from the durable store and
    /// skipped. A failing store yields an empty load.
    pub async fn warm_load(&self) -> Vec<CacheEntry> {
        let keys = match self.namespace_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Warm load skipped, durable store unavailable: {}", e);
                return Vec::new();
            }
        };

        let now = current_timestamp_ms();
        let mut loaded = Vec::with_capacity(keys.len());
        let mut discarded = 0usize;

        for key in keys {
            match self.read_record(&key).await {
                Ok(Some(record)) if !record.is_expired_at(now) => {
                    loaded.push(record.into_entry(&key));
                }
                Ok(None) => {}
                Ok(Some(_)) => {
                    discarded += 1;
                    self.remove(&key).await;
                }
                Err(e) => {
                    warn!("Discarding unreadable durable record '{}': {}", key, e);
                    discarded += 1;
                    self.remove(&key).await;
                }
            }
        }

        info!(
            "Warm load: restored {} entries, discarded {}",
            loaded.len(),
            discarded
        );
        loaded
    }

    // == Persist ==
    /// Writes an entry to the durable store.
    ///
    /// Compressed entries are never persisted. On failure any older record
    /// for the key is removed, the namespace is swept for expired records
    /// and the write is dropped. Returns whether the entry was written.
    pub async fn persist(&self, entry: &CacheEntry) -> bool {
        if entry.compressed {
            debug!("Not persisting compressed entry '{}'", entry.key);
            return false;
        }

        let result = match PersistedEntry::from_entry(entry)
            .and_then(|record| serde_json::to_string(&record).map_err(StorageError::from))
        {
            Ok(raw) => self.store.set(&self.namespaced(&entry.key), raw).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist '{}', dropping write: {}", entry.key, e);
                self.remove(&entry.key).await;
                let purged = self.purge_expired().await;
                debug!("Post-failure cleanup purged {} durable records", purged);
                false
            }
        }
    }

    // == Remove ==
    /// Best-effort removal of one key.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.namespaced(key)).await {
            warn!("Failed to remove durable record '{}': {}", key, e);
        }
    }

    // == Clear ==
    /// Removes every record under the namespace.
    pub async fn clear(&self) {
        match self.namespace_keys().await {
            Ok(keys) => {
                for key in keys {
                    self.remove(&key).await;
                }
            }
            Err(e) => warn!("Failed to enumerate durable records for clear: {}", e),
        }
    }

    // == Purge Expired ==
    /// Sweeps the namespace, removing expired and unreadable records.
    ///
    /// Returns the number of records removed.
    pub async fn purge_expired(&self) -> usize {
        let keys = match self.namespace_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Durable cleanup skipped: {}", e);
                return 0;
            }
        };

        let now = current_timestamp_ms();
        let mut purged = 0;
        for key in keys {
            let dead = match self.read_record(&key).await {
                Ok(Some(record)) => record.is_expired_at(now),
                Ok(None) => false,
                Err(_) => true,
            };
            if dead {
                self.remove(&key).await;
                purged += 1;
            }
        }
        purged
    }
}

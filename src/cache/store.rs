//! Cache Store Module
//!
//! Main cache engine: a HashMap of entries with TTL expiry, optional payload
//! compression, score-based eviction and best-effort durable persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{
    current_timestamp_ms, default_codec, CacheEntry, CacheStats, CompressionCodec,
    EvictionPolicy, StatsCounters,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::persistence::{DurableStore, PersistenceAdapter};

// == Set Options ==
/// Per-call overrides for [`CacheStore::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Lifetime of the entry, the store default when `None`
    pub ttl: Option<Duration>,
    /// `Some(false)` disables compression for this entry
    pub compress: Option<bool>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }
}

// == Cache Store ==
/// In-memory entry table composed with a codec, an eviction policy and a
/// durable store.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Running sum of `size_bytes` over `entries`
    total_size: usize,
    codec: Arc<dyn CompressionCodec>,
    eviction: EvictionPolicy,
    persistence: PersistenceAdapter,
    /// Lookup and eviction counters
    counters: StatsCounters,
    /// Byte budget that triggers eviction
    max_size: usize,
    default_ttl: Duration,
    compression_threshold: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. Nothing is read from `durable` until
    /// [`CacheStore::warm_load`] runs.
    pub fn new(config: &CacheConfig, durable: Arc<dyn DurableStore>) -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            codec: default_codec(),
            eviction: EvictionPolicy::new(),
            persistence: PersistenceAdapter::new(durable, config.namespace.clone()),
            counters: StatsCounters::new(),
            max_size: config.max_size,
            default_ttl: config.default_ttl,
            compression_threshold: config.compression_threshold,
        }
    }

    /// Creates a store and populates it from the durable store.
    pub async fn init(config: &CacheConfig, durable: Arc<dyn DurableStore>) -> Self {
        let mut store = Self::new(config, durable);
        store.warm_load().await;
        store
    }

    /// Replaces the compression codec.
    pub fn with_codec(mut self, codec: Arc<dyn CompressionCodec>) -> Self {
        self.codec = codec;
        self
    }

    // == Warm Load ==
    /// Loads every live durable record into the table.
    ///
    /// Returns the number of entries restored.
    pub async fn warm_load(&mut self) -> usize {
        let loaded = self.persistence.warm_load().await;
        let count = loaded.len();
        for entry in loaded {
            self.insert_entry(entry);
        }
        count
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// The value is serialized to JSON and compressed when it is larger than
    /// the compression threshold, unless `options.compress` is `Some(false)`.
    /// A failed compression stores the raw bytes instead. Capacity is
    /// enforced before returning and evicted keys leave the durable store;
    /// a surviving uncompressed entry is then persisted.
    pub async fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }

        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let serialized = serde_json::to_vec(value)?;

        let wants_compression =
            options.compress != Some(false) && serialized.len() > self.compression_threshold;
        let (payload, compressed) = if wants_compression {
            match self.codec.compress(&serialized) {
                Ok(bytes) => {
                    debug!(
                        "Compressed '{}' with {}: {} -> {} bytes",
                        key,
                        self.codec.name(),
                        serialized.len(),
                        bytes.len()
                    );
                    (bytes, true)
                }
                Err(e) => {
                    warn!("Compression failed for '{}', storing raw: {}", key, e);
                    (serialized, false)
                }
            }
        } else {
            (serialized, false)
        };

        let entry = CacheEntry::new(key, payload, ttl, compressed);
        let durable_copy = (!entry.compressed).then(|| entry.clone());

        self.insert_entry(entry);
        for victim in self.enforce_capacity() {
            self.persistence.remove(&victim).await;
        }

        match durable_copy {
            Some(entry) if self.entries.contains_key(key) => {
                self.persistence.persist(&entry).await;
            }
            // Compressed entries are never persisted; an older record for
            // the key must not outlive the overwrite
            None => self.persistence.remove(key).await,
            // Evicted by its own pass, durable record already removed
            Some(_) => {}
        }

        Ok(())
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns `Ok(None)` on a miss. Expired entries and entries whose payload
    /// cannot be decompressed are removed and reported as misses.
    pub async fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let now = current_timestamp_ms();

        let lookup = match self.entries.get_mut(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_expired_at(now) => Lookup::Expired,
            Some(entry) => {
                entry.record_access(now);
                if entry.compressed {
                    match self.codec.decompress(&entry.payload) {
                        Ok(bytes) => Lookup::Found(bytes),
                        Err(e) => Lookup::Corrupt(e.to_string()),
                    }
                } else {
                    Lookup::Found(entry.payload.clone())
                }
            }
        };

        match lookup {
            Lookup::Found(bytes) => {
                let value = serde_json::from_slice(&bytes)?;
                self.counters.record_hit();
                Ok(Some(value))
            }
            Lookup::Absent => {
                self.counters.record_miss();
                Ok(None)
            }
            Lookup::Expired => {
                debug!("Lazy expiry of '{}'", key);
                self.delete(key).await;
                self.counters.record_miss();
                Ok(None)
            }
            Lookup::Corrupt(reason) => {
                warn!("Dropping corrupt entry '{}': {}", key, reason);
                self.delete(key).await;
                self.counters.record_miss();
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Removes an entry from memory and from the durable store.
    ///
    /// Deleting an absent key is a no-op. Returns whether an entry was held
    /// in memory.
    pub async fn delete(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        self.persistence.remove(key).await;
        removed
    }

    // == Clear ==
    /// Empties the table and every durable record under the namespace.
    pub async fn clear(&mut self) {
        self.entries.clear();
        self.total_size = 0;
        self.persistence.clear().await;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::collect(self.entries.values(), &self.counters)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries through the delete path.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.delete(key).await;
        }

        expired_keys.len()
    }

    // == Accessors ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry is physically present, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot of the keys currently held.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Sum of stored payload sizes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Read-only view of an entry's metadata.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Internals ==
    fn insert_entry(&mut self, entry: CacheEntry) {
        self.total_size += entry.size_bytes;
        if let Some(previous) = self.entries.insert(entry.key.clone(), entry) {
            self.total_size -= previous.size_bytes;
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key)?;
        self.total_size -= removed.size_bytes;
        Some(removed)
    }

    /// Runs one eviction pass when the table is over budget.
    ///
    /// The pass itself never yields; returns the evicted keys so the caller
    /// can drop their durable records.
    fn enforce_capacity(&mut self) -> Vec<String> {
        if self.total_size <= self.max_size {
            return Vec::new();
        }

        let now = current_timestamp_ms();
        let victims: Vec<String> = self
            .eviction
            .select_victims(self.entries.values(), now)
            .into_iter()
            .map(|candidate| candidate.key)
            .collect();
        for key in &victims {
            self.remove_entry(key);
        }
        self.counters.record_evictions(victims.len());

        info!(
            "Evicted {} entries, {} of {} bytes in use",
            victims.len(),
            self.total_size,
            self.max_size
        );
        victims
    }
}

enum Lookup {
    Absent,
    Expired,
    Corrupt(String),
    Found(Vec<u8>),
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Base64Codec;
    use crate::error::CodecError;
    use crate::persistence::MemoryStore;
    use std::thread::sleep;

    #[derive(Debug)]
    struct BrokenCodec;

    impl CompressionCodec for BrokenCodec {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn compress(&self, _data: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
            Err(CodecError::Compress("encoder unavailable".to_string()))
        }

        fn decompress(&self, _data: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
            Err(CodecError::Corruption("bad header".to_string()))
        }
    }

    fn test_store(max_size: usize) -> (CacheStore, MemoryStore) {
        let durable = MemoryStore::new();
        let config = CacheConfig::default().with_max_size(max_size);
        (CacheStore::new(&config, Arc::new(durable.clone())), durable)
    }

    /// A string that serializes to exactly `len` bytes of JSON.
    fn json_sized(len: usize) -> String {
        "x".repeat(len - 2)
    }

    #[tokio::test]
    async fn test_store_new() {
        let (store, _) = test_store(1000);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let (mut store, durable) = test_store(1000);

        store.set("key1", "value1", SetOptions::new()).await.unwrap();
        let value: Option<String> = store.get("key1").await.unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
        assert!(durable.get("cache_key1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let (mut store, _) = test_store(1000);

        let result: Option<String> = store.get("nonexistent").await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_store_rejects_empty_key() {
        let (mut store, _) = test_store(1000);

        let result = store.set("", "value", SetOptions::new()).await;
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_store_type_mismatch_is_error() {
        let (mut store, _) = test_store(1000);

        store.set("n", &42u32, SetOptions::new()).await.unwrap();
        let result: Result<Option<Vec<String>>> = store.get("n").await;
        assert!(matches!(result, Err(CacheError::Serialization(_))));

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_compressed_overwrite_drops_durable_record() {
        let (mut store, durable) = test_store(1_000_000);

        store.set("k", "old", SetOptions::new()).await.unwrap();
        assert!(durable.get("cache_k").await.unwrap().is_some());

        store
            .set("k", &"abcdefgh".repeat(512), SetOptions::new())
            .await
            .unwrap();

        assert!(store.entry("k").unwrap().compressed);
        assert!(durable.get("cache_k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eviction_drops_durable_records() {
        let (mut store, durable) = test_store(100);

        for key in ["a", "b", "c", "d"] {
            store.set(key, &json_sized(30), SetOptions::new()).await.unwrap();
            sleep(Duration::from_millis(2));
        }

        // "a" is the oldest of four unread entries
        assert!(!store.contains_key("a"));
        assert!(durable.get("cache_a").await.unwrap().is_none());
        assert_eq!(durable.len().await, 3);
    }

    #[tokio::test]
    async fn test_entry_evicted_by_own_set_is_not_persisted() {
        let (mut store, durable) = test_store(100);

        for key in ["a", "b", "c"] {
            store.set(key, &json_sized(30), SetOptions::new()).await.unwrap();
            let _: Option<String> = store.get(key).await.unwrap();
        }
        sleep(Duration::from_millis(10));
        store.set("d", &json_sized(30), SetOptions::new()).await.unwrap();

        assert!(!store.contains_key("d"));
        assert!(durable.get("cache_d").await.unwrap().is_none());
        assert_eq!(durable.len().await, 3);
    }

    #[tokio::test]
    async fn test_store_overwrite_replaces_entry() {
        let (mut store, _) = test_store(1000);

        store.set("key1", "value1", SetOptions::new()).await.unwrap();
        let _: Option<String> = store.get("key1").await.unwrap();
        store.set("key1", "value-two", SetOptions::new()).await.unwrap();

        let entry = store.entry("key1").unwrap();
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.size_bytes, 11);
        assert_eq!(store.total_size(), 11);

        let value: Option<String> = store.get("key1").await.unwrap();
        assert_eq!(value.as_deref(), Some("value-two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_records_access() {
        let (mut store, _) = test_store(1000);

        store.set("k", "v", SetOptions::new()).await.unwrap();
        let created = store.entry("k").unwrap().created_at;
        sleep(Duration::from_millis(5));
        let _: Option<String> = store.get("k").await.unwrap();
        let _: Option<String> = store.get("k").await.unwrap();

        let entry = store.entry("k").unwrap();
        assert_eq!(entry.access_count, 2);
        assert!(entry.last_access_at > created);
    }

    #[tokio::test]
    async fn test_large_value_is_compressed_and_not_persisted() {
        let (mut store, durable) = test_store(1_000_000);
        let big = "abcdefgh".repeat(512);

        store.set("big", &big, SetOptions::new()).await.unwrap();

        let entry = store.entry("big").unwrap();
        assert!(entry.compressed);
        assert_eq!(entry.size_bytes, entry.payload.len());
        assert!(durable.is_empty().await);

        let value: Option<String> = store.get("big").await.unwrap();
        assert_eq!(value, Some(big));
        assert_eq!(store.stats().compression_ratio, 1.0);
    }

    #[tokio::test]
    async fn test_compress_false_stores_raw() {
        let (mut store, durable) = test_store(1_000_000);
        let big = "abcdefgh".repeat(512);

        store
            .set("big", &big, SetOptions::new().compress(false))
            .await
            .unwrap();

        assert!(!store.entry("big").unwrap().compressed);
        assert!(durable.get("cache_big").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_small_value_not_compressed() {
        let (mut store, _) = test_store(1000);

        store.set("small", "tiny", SetOptions::new().compress(true)).await.unwrap();
        assert!(!store.entry("small").unwrap().compressed);
    }

    #[tokio::test]
    async fn test_fallback_codec_round_trip() {
        let (store, _) = test_store(1_000_000);
        let mut store = store.with_codec(Arc::new(Base64Codec));
        let big: Vec<u32> = (0..1000).collect();

        store.set("nums", &big, SetOptions::new()).await.unwrap();
        assert!(store.entry("nums").unwrap().compressed);

        let value: Option<Vec<u32>> = store.get("nums").await.unwrap();
        assert_eq!(value, Some(big));
    }

    #[tokio::test]
    async fn test_compression_failure_stores_raw() {
        let (store, durable) = test_store(1_000_000);
        let mut store = store.with_codec(Arc::new(BrokenCodec));
        let big = "z".repeat(4096);

        store.set("big", &big, SetOptions::new()).await.unwrap();

        assert!(!store.entry("big").unwrap().compressed);
        assert!(durable.get("cache_big").await.unwrap().is_some());
        let value: Option<String> = store.get("big").await.unwrap();
        assert_eq!(value, Some(big));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_removed() {
        let (mut store, _) = test_store(1000);
        let corrupt = CacheEntry::new("bad", b"not a gzip stream".to_vec(), Duration::from_secs(60), true);
        store.insert_entry(corrupt);

        let value: Option<String> = store.get("bad").await.unwrap();

        assert!(value.is_none());
        assert!(!store.contains_key("bad"));
        assert_eq!(store.total_size(), 0);
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let (mut store, durable) = test_store(1000);

        store
            .set("key1", "value1", SetOptions::new().ttl(Duration::from_millis(1000)))
            .await
            .unwrap();
        let before: Option<String> = store.get("key1").await.unwrap();
        assert!(before.is_some());

        sleep(Duration::from_millis(1100));

        let after: Option<String> = store.get("key1").await.unwrap();
        assert!(after.is_none());
        assert!(!store.contains_key("key1"));
        assert!(durable.get("cache_key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eviction_removes_lowest_score() {
        let (mut store, _) = test_store(100);
        let value = json_sized(30);

        for key in ["a", "b", "c"] {
            store.set(key, &value, SetOptions::new()).await.unwrap();
        }
        for _ in 0..3 {
            let _: Option<String> = store.get("a").await.unwrap();
        }
        let _: Option<String> = store.get("b").await.unwrap();
        sleep(Duration::from_millis(10));

        // Pushes the total to 120 bytes; "c" and "d" were never read and
        // score 0, the older one goes
        store.set("d", &value, SetOptions::new()).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.total_size(), 90);
        assert!(!store.contains_key("c"));
        assert!(store.contains_key("a"));
        assert!(store.contains_key("b"));
        assert!(store.contains_key("d"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_eviction_is_single_pass() {
        let (mut store, _) = test_store(100);

        for key in ["a", "b", "c", "d"] {
            store.set(key, &json_sized(10), SetOptions::new()).await.unwrap();
            sleep(Duration::from_millis(2));
        }
        store.set("e", &json_sized(95), SetOptions::new()).await.unwrap();

        // 135 bytes over 5 entries: one pass drops ceil(1.25) = 2 entries
        assert_eq!(store.len(), 3);
        assert_eq!(store.total_size(), 115);
        assert!(!store.contains_key("a"));
        assert!(!store.contains_key("b"));
    }

    #[tokio::test]
    async fn test_store_delete() {
        let (mut store, durable) = test_store(1000);

        store.set("key1", "value1", SetOptions::new()).await.unwrap();
        assert!(store.delete("key1").await);

        assert!(store.is_empty());
        assert!(durable.is_empty().await);
        let value: Option<String> = store.get("key1").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_store_delete_nonexistent_is_noop() {
        let (mut store, _) = test_store(1000);
        assert!(!store.delete("nonexistent").await);
        assert!(!store.delete("nonexistent").await);
    }

    #[tokio::test]
    async fn test_store_clear() {
        let (mut store, durable) = test_store(1000);

        store.set("a", "1", SetOptions::new()).await.unwrap();
        store.set("b", "2", SetOptions::new()).await.unwrap();
        store.clear().await;

        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
        assert!(durable.is_empty().await);

        // Clearing an empty cache is fine
        store.clear().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_cleanup_expired() {
        let (mut store, durable) = test_store(1000);

        store
            .set("key1", "value1", SetOptions::new().ttl(Duration::from_millis(50)))
            .await
            .unwrap();
        store
            .set("key2", "value2", SetOptions::new().ttl(Duration::from_secs(10)))
            .await
            .unwrap();

        sleep(Duration::from_millis(100));

        let removed = store.cleanup_expired().await;
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(durable.len().await, 1);
        assert!(store.contains_key("key2"));
    }

    #[tokio::test]
    async fn test_store_stats() {
        let (mut store, _) = test_store(1000);

        store.set("key1", "value1", SetOptions::new()).await.unwrap();
        let _: Option<String> = store.get("key1").await.unwrap(); // hit
        let _: Option<String> = store.get("nonexistent").await.unwrap(); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.total_size, 8);
        assert_eq!(stats.total_accesses, 1);
    }

    #[tokio::test]
    async fn test_init_warm_loads_uncompressed_entries() {
        let durable = MemoryStore::new();
        let config = CacheConfig::default();
        {
            let mut store = CacheStore::new(&config, Arc::new(durable.clone()));
            store.set("plain", "hello", SetOptions::new()).await.unwrap();
            store.set("big", &"q".repeat(4096), SetOptions::new()).await.unwrap();
        }

        let mut restarted = CacheStore::init(&config, Arc::new(durable)).await;

        assert_eq!(restarted.len(), 1);
        assert_eq!(restarted.total_size(), 7);
        let plain: Option<String> = restarted.get("plain").await.unwrap();
        assert_eq!(plain.as_deref(), Some("hello"));
        let big: Option<String> = restarted.get("big").await.unwrap();
        assert!(big.is_none());
    }
}

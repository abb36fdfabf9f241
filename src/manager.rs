//! Cache Manager
//!
//! Owns a cache instance for its whole lifetime: warm-load and sweeper start
//! on [`CacheManager::init`], sweeper shutdown on [`CacheManager::dispose`].
//! Consumers receive the manager (or its shared store handle) by injection.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{default_codec, CacheStats, CacheStore, CompressionCodec, SetOptions};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::persistence::{DurableStore, FileStore, MemoryStore};
use crate::tasks::spawn_sweeper;

/// A running cache with its background sweeper.
///
/// Contains the cache store wrapped in Arc<RwLock<>> for shared access.
#[derive(Debug)]
pub struct CacheManager {
    cache: Arc<RwLock<CacheStore>>,
    sweeper: Option<JoinHandle<()>>,
}

impl CacheManager {
    // == Lifecycle ==
    /// Builds a cache over `durable`, warm-loads it and starts the sweeper.
    pub async fn init(config: &CacheConfig, durable: Arc<dyn DurableStore>) -> Self {
        Self::init_with_codec(config, durable, default_codec()).await
    }

    /// Like [`CacheManager::init`] with an explicit compression codec.
    pub async fn init_with_codec(
        config: &CacheConfig,
        durable: Arc<dyn DurableStore>,
        codec: Arc<dyn CompressionCodec>,
    ) -> Self {
        let store = CacheStore::new(config, durable).with_codec(codec);
        let cache = Arc::new(RwLock::new(store));

        let restored = cache.write().await.warm_load().await;
        let sweeper = spawn_sweeper(cache.clone(), config.sweep_interval);

        info!(
            "Cache initialized: {} entries restored, max_size={} bytes, default_ttl={:?}",
            restored, config.max_size, config.default_ttl
        );

        Self {
            cache,
            sweeper: Some(sweeper),
        }
    }

    /// Opens the durable store named by `config` and initializes over it.
    ///
    /// Uses a [`FileStore`] when `data_dir` is set, else a [`MemoryStore`].
    pub async fn open(config: &CacheConfig) -> Result<Self> {
        let durable: Arc<dyn DurableStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::open(dir).await?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::init(config, durable).await)
    }

    /// Stops the sweeper. In-memory state is dropped with the manager;
    /// durable records stay for the next warm-load.
    pub async fn dispose(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
            // A cancelled task reports a JoinError; nothing to recover
            let _ = sweeper.await;
        }
        info!("Cache disposed");
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        self.cache.clone()
    }

    // == Cache API ==
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<()> {
        self.cache.write().await.set(key, value, options).await
    }

    /// Needs the write lock: a read updates access metadata.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.cache.write().await.get(key).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.cache.write().await.delete(key).await
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear().await;
        debug!("Cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

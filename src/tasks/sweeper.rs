//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries, including
//! ones nobody reads again and lazy expiry would never see.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between passes.
/// Each pass holds the write lock for its whole duration, so it never
/// interleaves with other cache operations. A zero interval is treated as
/// one millisecond.
///
/// # Arguments
/// * `cache` - shared reference to the cache
/// * `interval` - time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted when the cache is disposed.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::init(&config, durable).await));
/// let sweeper = spawn_sweeper(cache.clone(), Duration::from_secs(60));
/// // Later, on dispose:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper(cache: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired().await
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

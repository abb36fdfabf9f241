//! Adaptive Cache - an in-process key/value cache
//!
//! Provides TTL expiration, payload compression, score-based eviction and
//! durable warm restart for uncompressed entries.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod persistence;
pub mod repl;
pub mod tasks;

pub use cache::{CacheStats, CacheStore, SetOptions};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use persistence::{DurableStore, FileStore, MemoryStore};
pub use tasks::spawn_sweeper;

//! Persistence Module
//!
//! Durable backing for uncompressed cache entries.
//!
//! # Components
//! - [`DurableStore`]: host-provided string key/value facility
//! - [`MemoryStore`]: process-local store with an optional byte quota
//! - [`FileStore`]: one file per key inside a directory
//! - [`PersistenceAdapter`]: namespacing, record encoding, warm-load and
//!   cleanup on top of any [`DurableStore`]

mod adapter;
mod file;
mod memory;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::StorageError;

pub use adapter::{PersistedEntry, PersistenceAdapter};
pub use file::FileStore;
pub use memory::MemoryStore;

// == Durable Store Trait ==
/// External key/value persistence facility.
///
/// Keys passed in are already namespaced by the adapter.
#[async_trait]
pub trait DurableStore: Send + Sync + Debug {
    /// Reads a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Removes a key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Enumerates every key currently held.
    async fn list_keys(&self) -> Result<Vec<String>, StorageError>;
}

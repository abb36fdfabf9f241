//! Cache Module
//!
//! Provides the in-memory cache engine with TTL expiry, payload compression
//! and score-based eviction.

mod codec;
mod entry;
mod eviction;
mod stats;
mod store;


// Re-export public types
#[cfg(feature = "gzip")]
pub use codec::GzipCodec;
pub use codec::{default_codec, Base64Codec, CompressionCodec};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use eviction::{EvictionCandidate, EvictionPolicy, DEFAULT_EVICTION_FRACTION};
pub use stats::{CacheStats, StatsCounters};
pub use store::{CacheStore, SetOptions};

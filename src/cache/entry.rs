//! Cache Entry Module
//!
//! Defines the record stored per key, with TTL and access metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cache entry with its payload and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Key the entry is stored under
    pub key: String,
    /// Stored bytes: the serialized value, or its compressed form
    pub payload: Vec<u8>,
    /// Time of the write that created this entry (Unix milliseconds)
    pub created_at: u64,
    /// Lifetime in milliseconds
    pub ttl_ms: u64,
    /// Whether `payload` must be decompressed before use
    pub compressed: bool,
    /// Length of `payload` as stored
    pub size_bytes: usize,
    /// Number of successful reads
    pub access_count: u64,
    /// Time of the last successful read (Unix milliseconds)
    pub last_access_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: impl Into<String>, payload: Vec<u8>, ttl: Duration, compressed: bool) -> Self {
        Self::with_timestamp(key, payload, ttl, compressed, current_timestamp_ms())
    }

    /// Creates a new entry as if written at `now`.
    pub fn with_timestamp(
        key: impl Into<String>,
        payload: Vec<u8>,
        ttl: Duration,
        compressed: bool,
        now: u64,
    ) -> Self {
        let size_bytes = payload.len();
        Self {
            key: key.into(),
            payload,
            created_at: now,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            compressed,
            size_bytes,
            access_count: 0,
            last_access_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against an explicit clock reading.
    ///
    /// An entry is dead once its age is strictly greater than its TTL.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) > self.ttl_ms
    }

    // == Record Access ==
    /// Bumps the access counter and refreshes the last access time.
    pub fn record_access(&mut self, now: u64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_access_at = now;
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let now = current_timestamp_ms();
        self.created_at.saturating_add(self.ttl_ms).saturating_sub(now)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

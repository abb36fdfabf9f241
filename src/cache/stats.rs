//! Cache Statistics Module
//!
//! Tracks lookup counters and aggregates a read-only snapshot of store state.

use serde::Serialize;

use crate::cache::CacheEntry;

// == Stats Counters ==
/// Running counters maintained by the store.
#[derive(Debug, Clone, Default)]
pub struct StatsCounters {
    /// Successful lookups
    pub hits: u64,
    /// Lookups that found nothing usable (absent, expired or corrupt)
    pub misses: u64,
    /// Entries removed by capacity enforcement
    pub evictions: u64,
}

impl StatsCounters {
    // == Constructor ==
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

// == Cache Stats ==
/// Point-in-time statistics for a cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries in the table
    pub item_count: usize,
    /// Sum of stored payload sizes in bytes
    pub total_size: usize,
    /// Mean stored payload size in bytes
    pub average_size: f64,
    /// Sum of per-entry access counts
    pub total_accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
    /// Fraction of entries stored compressed
    pub compression_ratio: f64,
}

impl CacheStats {
    // == Collect ==
    /// Aggregates a snapshot over `entries` and the running counters.
    pub fn collect<'a>(
        entries: impl Iterator<Item = &'a CacheEntry>,
        counters: &StatsCounters,
    ) -> Self {
        let mut item_count = 0usize;
        let mut total_size = 0usize;
        let mut total_accesses = 0u64;
        let mut compressed = 0usize;

        for entry in entries {
            item_count += 1;
            total_size += entry.size_bytes;
            total_accesses += entry.access_count;
            if entry.compressed {
                compressed += 1;
            }
        }

        Self {
            item_count,
            total_size,
            average_size: ratio(total_size as f64, item_count as f64),
            total_accesses,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            hit_rate: ratio(counters.hits as f64, (counters.hits + counters.misses) as f64),
            compression_ratio: ratio(compressed as f64, item_count as f64),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

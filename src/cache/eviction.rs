//! Eviction Policy Module
//!
//! Score-based capacity enforcement. Each pass ranks live entries by
//!
//! ```text
//! score(entry) = access_count × (now − last_access_at)
//! ```
//!
//! and removes the lowest-scoring quarter. A pass never repeats itself, so a
//! store can stay over budget until the next write triggers another pass.
//!
//! Note that an entry read often and read just now scores close to zero and
//! goes first, as does any entry that was never read.

use std::cmp::Ordering;

use crate::cache::CacheEntry;

/// Share of entries removed by a single pass
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.25;

/// An eviction candidate with its computed score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    pub key: String,
    pub score: u128,
    created_at: u64,
}

impl EvictionCandidate {
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then(self.created_at.cmp(&other.created_at))
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// The eviction policy engine.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    fraction: f64,
}

impl EvictionPolicy {
    pub fn new() -> Self {
        Self::with_fraction(DEFAULT_EVICTION_FRACTION)
    }

    /// Policy removing `fraction` (clamped to `0.0..=1.0`) of entries per pass.
    pub fn with_fraction(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    /// Compute the score of a single entry.
    pub fn score(entry: &CacheEntry, now: u64) -> u128 {
        let idle = now.saturating_sub(entry.last_access_at);
        u128::from(entry.access_count) * u128::from(idle)
    }

    /// Number of victims a pass over `entry_count` entries removes.
    pub fn victim_count(&self, entry_count: usize) -> usize {
        ((entry_count as f64) * self.fraction).ceil() as usize
    }

    /// Select the entries one pass would remove, lowest score first.
    ///
    /// Ties go to the older entry, then to the smaller key.
    pub fn select_victims<'a>(
        &self,
        entries: impl Iterator<Item = &'a CacheEntry>,
        now: u64,
    ) -> Vec<EvictionCandidate> {
        let mut candidates: Vec<EvictionCandidate> = entries
            .map(|entry| EvictionCandidate {
                key: entry.key.clone(),
                score: Self::score(entry, now),
                created_at: entry.created_at,
            })
            .collect();

        let count = self.victim_count(candidates.len());
        candidates.sort_by(EvictionCandidate::rank);
        candidates.truncate(count);
        candidates
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default byte budget for the in-memory table (50 MiB)
pub const DEFAULT_MAX_SIZE: usize = 50 * 1024 * 1024;
/// Default entry lifetime in milliseconds (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;
/// Serialized payloads larger than this are compressed
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;
/// Default sweeper period in milliseconds
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;
/// Default key prefix inside the durable store
pub const DEFAULT_NAMESPACE: &str = "cache_";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Total stored bytes above which eviction runs
    pub max_size: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Minimum serialized size that triggers compression
    pub compression_threshold: usize,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
    /// Key prefix scoping this cache inside the durable store
    pub namespace: String,
    /// Directory for the file-backed durable store, memory-only when unset
    pub data_dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Byte budget (default: 50 MiB)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_COMPRESSION_THRESHOLD` - Compression threshold in bytes (default: 1024)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweeper period in milliseconds (default: 60000)
    /// - `CACHE_NAMESPACE` - Durable key prefix (default: `cache_`)
    /// - `CACHE_DATA_DIR` - Directory for durable entries (default: unset)
    pub fn from_env() -> Self {
        Self {
            max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(DEFAULT_MAX_SIZE),
            default_ttl: Duration::from_millis(
                parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(DEFAULT_TTL_MS),
            ),
            compression_threshold: parse_var("CACHE_COMPRESSION_THRESHOLD")
                .unwrap_or(DEFAULT_COMPRESSION_THRESHOLD),
            sweep_interval: Duration::from_millis(
                parse_var("CACHE_SWEEP_INTERVAL_MS").unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
            ),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            data_dir: env::var("CACHE_DATA_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Builder-style override of the byte budget.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Builder-style override of the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Builder-style override of the sweeper period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            namespace: DEFAULT_NAMESPACE.to_string(),
            data_dir: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 50 * 1024 * 1024);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.compression_threshold, 1024);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.namespace, "cache_");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_COMPRESSION_THRESHOLD");
        env::remove_var("CACHE_SWEEP_INTERVAL_MS");
        env::remove_var("CACHE_NAMESPACE");
        env::remove_var("CACHE_DATA_DIR");

        let config = CacheConfig::from_env();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.default_ttl, Duration::from_millis(DEFAULT_TTL_MS));
        assert_eq!(config.compression_threshold, DEFAULT_COMPRESSION_THRESHOLD);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_max_size(100)
            .with_default_ttl(Duration::from_secs(1))
            .with_sweep_interval(Duration::from_millis(50));
        assert_eq!(config.max_size, 100);
        assert_eq!(config.default_ttl, Duration::from_secs(1));
        assert_eq!(config.sweep_interval, Duration::from_millis(50));
    }
}

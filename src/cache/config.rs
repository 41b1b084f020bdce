//! Cache configuration.
//!
//! The results cache freshness window and the health snapshot TTL come from
//! `freshgate.toml`. The TTL store fields are library defaults for callers
//! that build a `TtlStore` themselves.

use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_RESULTS_STALE_TIME_SECONDS: u64 = 86_400;
const DEFAULT_HEALTH_TTL_MS: u64 = 180_000;
const DEFAULT_STORE_TTL_SECONDS: u64 = 60;
const DEFAULT_STORE_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Cache configuration from `freshgate.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve persisted query results while they are fresh.
    pub results_enabled: bool,
    /// Staleness window of persisted results, in seconds.
    pub results_stale_time_seconds: u64,
    /// Lifetime of the shared health snapshot, in milliseconds.
    pub health_ttl_ms: u64,
    /// TTL applied by `TtlStore::set`.
    pub store_default_ttl_seconds: u64,
    /// Period of the TTL store sweeper.
    pub store_sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            results_enabled: true,
            results_stale_time_seconds: DEFAULT_RESULTS_STALE_TIME_SECONDS,
            health_ttl_ms: DEFAULT_HEALTH_TTL_MS,
            store_default_ttl_seconds: DEFAULT_STORE_TTL_SECONDS,
            store_sweep_interval_ms: DEFAULT_STORE_SWEEP_INTERVAL_MS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            results_enabled: settings.results_enabled,
            results_stale_time_seconds: settings.results_stale_time.as_secs(),
            health_ttl_ms: settings.health_ttl.as_millis() as u64,
            ..Self::default()
        }
    }
}

impl CacheConfig {
    pub fn results_stale_window(&self) -> Duration {
        Duration::from_secs(self.results_stale_time_seconds)
    }

    pub fn health_ttl(&self) -> Duration {
        Duration::from_millis(self.health_ttl_ms)
    }

    pub fn store_default_ttl(&self) -> Duration {
        Duration::from_secs(self.store_default_ttl_seconds)
    }

    /// Sweep period, clamped to at least one millisecond.
    pub fn store_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.store_sweep_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.results_enabled);
        assert_eq!(config.results_stale_time_seconds, 86_400);
        assert_eq!(config.health_ttl_ms, 180_000);
        assert_eq!(config.store_default_ttl_seconds, 60);
        assert_eq!(config.store_sweep_interval_ms, 1_000);
    }

    #[test]
    fn durations_follow_fields() {
        let config = CacheConfig {
            results_stale_time_seconds: 600,
            health_ttl_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.results_stale_window(), Duration::from_secs(600));
        assert_eq!(config.health_ttl(), Duration::from_millis(250));
        assert_eq!(config.store_default_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn settings_conversion_keeps_store_defaults() {
        let settings = crate::config::CacheSettings {
            results_enabled: false,
            results_stale_time: Duration::from_secs(0),
            health_ttl: Duration::from_millis(500),
        };

        let config = CacheConfig::from(&settings);
        assert!(!config.results_enabled);
        assert_eq!(config.results_stale_time_seconds, 0);
        assert_eq!(config.health_ttl_ms, 500);
        assert_eq!(config.store_default_ttl(), Duration::from_secs(60));
        assert_eq!(config.store_sweep_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn sweep_interval_clamps_to_min() {
        let config = CacheConfig {
            store_sweep_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.store_sweep_interval(), Duration::from_millis(1));
    }
}

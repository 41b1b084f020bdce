//! Adaptive freshness gate for persisted query results.
//!
//! A persisted result is served only while its recorded expiry lies further
//! in the future than an expiry buffer. The buffer scales with the configured
//! staleness window, so results turn stale slightly before they literally
//! expire and callers recompute ahead of the expiry instant instead of all at
//! once.

use std::time::Duration;

use crate::domain::query_history::{CacheHit, FreshnessCandidate};

use super::clock::duration_millis;
use super::config::CacheConfig;

/// Upper bound for the expiry buffer (10 minutes).
pub const DEFAULT_EXPIRY_BUFFER_MS: i64 = 10 * 60 * 1000;

/// Expiry buffer for a staleness window.
///
/// Windows longer than four default buffers use the default buffer; shorter
/// windows use a quarter of the window.
pub fn expiry_buffer_ms(stale_window_ms: i64) -> i64 {
    if stale_window_ms > DEFAULT_EXPIRY_BUFFER_MS * 4 {
        DEFAULT_EXPIRY_BUFFER_MS
    } else {
        stale_window_ms / 4
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FreshnessGate {
    enabled: bool,
    stale_window: Duration,
}

impl FreshnessGate {
    pub fn new(enabled: bool, stale_window: Duration) -> Self {
        Self {
            enabled,
            stale_window,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn buffer_ms(&self) -> i64 {
        expiry_buffer_ms(duration_millis(self.stale_window))
    }

    /// Whether `candidate` may be served at `now_ms`.
    pub fn is_fresh(&self, candidate: Option<&FreshnessCandidate>, now_ms: i64) -> bool {
        self.evaluate(candidate, now_ms).is_some()
    }

    /// The servable payload of `candidate`, or `None` on a miss.
    pub fn evaluate(
        &self,
        candidate: Option<&FreshnessCandidate>,
        now_ms: i64,
    ) -> Option<CacheHit> {
        if !self.enabled {
            return None;
        }

        let hit = candidate?.complete()?;
        let threshold = now_ms.saturating_add(self.buffer_ms());
        (hit.expires_at_ms > threshold).then_some(hit)
    }
}

impl From<&CacheConfig> for FreshnessGate {
    fn from(config: &CacheConfig) -> Self {
        Self::new(config.results_enabled, config.results_stale_window())
    }
}

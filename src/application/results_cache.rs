//! Lookup of persisted query results that are still fresh enough to serve.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{QueryHistoryRepo, RepoError};
use crate::cache::{Clock, FreshnessGate};
use crate::domain::query_history::CacheHit;

const METRIC_RESULTS_HIT: &str = "freshgate_results_cache_hit_total";
const METRIC_RESULTS_MISS: &str = "freshgate_results_cache_miss_total";

#[derive(Clone)]
pub struct ResultsCacheService {
    history: Arc<dyn QueryHistoryRepo>,
    gate: FreshnessGate,
    clock: Arc<dyn Clock>,
}

impl ResultsCacheService {
    pub fn new(
        history: Arc<dyn QueryHistoryRepo>,
        gate: FreshnessGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            gate,
            clock,
        }
    }

    /// Returns the cached result for `cache_key`, or `None` when nothing fresh
    /// is available. A disabled gate never reaches the repository.
    pub async fn find_cached_results(
        &self,
        project_uuid: Uuid,
        cache_key: &str,
    ) -> Result<Option<CacheHit>, RepoError> {
        if !self.gate.is_enabled() {
            return Ok(None);
        }

        let candidate = self
            .history
            .find_most_recent_by_cache_key(cache_key, project_uuid)
            .await?;
        let hit = self
            .gate
            .evaluate(candidate.as_ref(), self.clock.now_millis());

        if hit.is_some() {
            counter!(METRIC_RESULTS_HIT).increment(1);
        } else {
            counter!(METRIC_RESULTS_MISS).increment(1);
        }
        debug!(
            %project_uuid,
            cache_key,
            found = candidate.is_some(),
            hit = hit.is_some(),
            "Results cache lookup"
        );

        Ok(hit)
    }
}

//! Persisted query results as seen by the results cache.

use std::collections::BTreeMap;

use serde::Serialize;

/// Column metadata keyed by field id. The cache treats the values as opaque.
pub type ResultColumns = BTreeMap<String, serde_json::Value>;

/// Most recent query-history record for a cache key.
///
/// Fields are optional because a record may still be written by a concurrent
/// query execution; such a record is never a cache hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreshnessCandidate {
    pub cache_key: String,
    pub results_file_name: Option<String>,
    pub columns: Option<ResultColumns>,
    pub original_columns: Option<ResultColumns>,
    pub pivot_values_columns: Option<ResultColumns>,
    pub pivot_total_column_count: Option<u32>,
    pub total_row_count: Option<u64>,
    pub results_created_at_ms: Option<i64>,
    pub results_updated_at_ms: Option<i64>,
    pub results_expires_at_ms: Option<i64>,
}

/// A complete, servable cached result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHit {
    pub cache_hit: bool,
    pub cache_key: String,
    pub file_name: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub expires_at_ms: i64,
    pub total_row_count: u64,
    pub columns: ResultColumns,
    pub original_columns: Option<ResultColumns>,
    pub pivot_values_columns: Option<ResultColumns>,
    pub pivot_total_column_count: Option<u32>,
}

impl FreshnessCandidate {
    /// Returns the servable payload if every required field has been written.
    pub fn complete(&self) -> Option<CacheHit> {
        Some(CacheHit {
            cache_hit: true,
            cache_key: self.cache_key.clone(),
            file_name: self.results_file_name.clone()?,
            created_at_ms: self.results_created_at_ms?,
            updated_at_ms: self.results_updated_at_ms?,
            expires_at_ms: self.results_expires_at_ms?,
            total_row_count: self.total_row_count?,
            columns: self.columns.clone()?,
            original_columns: self.original_columns.clone(),
            pivot_values_columns: self.pivot_values_columns.clone(),
            pivot_total_column_count: self.pivot_total_column_count,
        })
    }
}

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::health::MigrationStatus;
use crate::domain::query_history::FreshnessCandidate;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
}

#[async_trait]
pub trait QueryHistoryRepo: Send + Sync {
    /// Most recently written record for `cache_key` within a project.
    async fn find_most_recent_by_cache_key(
        &self,
        cache_key: &str,
        project_uuid: Uuid,
    ) -> Result<Option<FreshnessCandidate>, RepoError>;
}

#[async_trait]
pub trait MigrationRepo: Send + Sync {
    async fn migration_status(&self) -> Result<MigrationStatus, RepoError>;
}

#[async_trait]
pub trait OrganizationRepo: Send + Sync {
    async fn has_orgs(&self) -> Result<bool, RepoError>;
}

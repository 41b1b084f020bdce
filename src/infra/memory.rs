//! In-memory repository adapters.
//!
//! Used by the binary when no database is attached, and by tests to script
//! repository answers.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{MigrationRepo, OrganizationRepo, QueryHistoryRepo, RepoError};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::health::MigrationStatus;
use crate::domain::query_history::FreshnessCandidate;

/// Query history keyed by project and cache key, keeping the latest record.
#[derive(Default)]
pub struct InMemoryQueryHistory {
    records: RwLock<HashMap<(Uuid, String), FreshnessCandidate>>,
    lookups: AtomicUsize,
}

impl InMemoryQueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `candidate` as the most recent entry for its cache key.
    pub fn insert(&self, project_uuid: Uuid, candidate: FreshnessCandidate) {
        let mut records = rw_write(&self.records, "infra::memory::query_history", "insert");
        records.insert((project_uuid, candidate.cache_key.clone()), candidate);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryHistoryRepo for InMemoryQueryHistory {
    async fn find_most_recent_by_cache_key(
        &self,
        cache_key: &str,
        project_uuid: Uuid,
    ) -> Result<Option<FreshnessCandidate>, RepoError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let records = rw_read(&self.records, "infra::memory::query_history", "find");
        Ok(records.get(&(project_uuid, cache_key.to_string())).cloned())
    }
}

/// Migration status that can be changed at runtime.
pub struct StaticMigrationStatus {
    status: RwLock<MigrationStatus>,
    calls: AtomicUsize,
}

impl StaticMigrationStatus {
    pub fn new(status: MigrationStatus) -> Self {
        Self {
            status: RwLock::new(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, status: MigrationStatus) {
        *rw_write(&self.status, "infra::memory::migrations", "set") = status;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MigrationRepo for StaticMigrationStatus {
    async fn migration_status(&self) -> Result<MigrationStatus, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = rw_read(&self.status, "infra::memory::migrations", "status");
        Ok(status.clone())
    }
}

#[derive(Default)]
pub struct InMemoryOrganizations {
    has_orgs: AtomicBool,
}

impl InMemoryOrganizations {
    pub fn new(has_orgs: bool) -> Self {
        Self {
            has_orgs: AtomicBool::new(has_orgs),
        }
    }

    pub fn set_has_orgs(&self, has_orgs: bool) {
        self.has_orgs.store(has_orgs, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrganizationRepo for InMemoryOrganizations {
    async fn has_orgs(&self) -> Result<bool, RepoError> {
        Ok(self.has_orgs.load(Ordering::SeqCst))
    }
}

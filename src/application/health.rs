//! Instance health snapshot, cached per authentication state.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::application::repos::{MigrationRepo, OrganizationRepo, RepoError};
use crate::cache::{Clock, SnapshotCache};
use crate::domain::health::{HealthState, PylonState, SessionUser};
use crate::domain::types::{InstallType, Mode};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("database has not been migrated yet (current version: {})", current_version.as_deref().unwrap_or("none"))]
    NotMigrated { current_version: Option<String> },
}

/// Instance facts that feed the health snapshot.
#[derive(Debug, Clone)]
pub struct HealthSettings {
    pub mode: Mode,
    pub install_type: InstallType,
    pub site_url: String,
    pub version: String,
    pub pylon_app_id: Option<String>,
    pub pylon_identity_verification_secret: Option<String>,
}

impl HealthSettings {
    /// dbt projects can be compiled locally unless the deployment forbids it.
    pub fn local_dbt_enabled(&self) -> bool {
        self.install_type != InstallType::Heroku && self.mode != Mode::CloudBeta
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Default,
            install_type: InstallType::Unknown,
            site_url: "http://localhost:8080".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pylon_app_id: None,
            pylon_identity_verification_secret: None,
        }
    }
}

#[derive(Clone)]
pub struct HealthService {
    settings: Arc<HealthSettings>,
    migrations: Arc<dyn MigrationRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    snapshot: Arc<SnapshotCache<bool, HealthState>>,
}

impl HealthService {
    pub fn new(
        settings: HealthSettings,
        migrations: Arc<dyn MigrationRepo>,
        organizations: Arc<dyn OrganizationRepo>,
        ttl: std::time::Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            migrations,
            organizations,
            snapshot: Arc::new(SnapshotCache::new(ttl, clock)),
        }
    }

    /// Health snapshot for the caller.
    ///
    /// The shared part is cached per authentication state; the support widget
    /// fields are derived from `user` on every call.
    pub async fn health_state(
        &self,
        user: Option<&SessionUser>,
    ) -> Result<HealthState, HealthError> {
        let is_authenticated = user.is_some();
        self.snapshot
            .get_or_compute(
                is_authenticated,
                || self.compute(is_authenticated),
                || self.pylon_state(user),
            )
            .await
    }

    /// Drop the cached snapshot so the next call recomputes.
    pub async fn invalidate(&self) {
        self.snapshot.clear().await;
    }

    async fn compute(&self, is_authenticated: bool) -> Result<HealthState, HealthError> {
        let started = Instant::now();
        let (migration, has_orgs) = tokio::try_join!(
            self.migrations.migration_status(),
            self.organizations.has_orgs(),
        )?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Health queries executed"
        );

        match migration.drift() {
            Ordering::Less => {
                return Err(HealthError::NotMigrated {
                    current_version: migration.current_version,
                });
            }
            Ordering::Greater => {
                warn!(
                    status = migration.status,
                    current_version = migration.current_version.as_deref(),
                    "Database has more migrations than defined in the code"
                );
            }
            Ordering::Equal => {}
        }

        Ok(HealthState {
            healthy: true,
            mode: self.settings.mode,
            version: self.settings.version.clone(),
            local_dbt_enabled: self.settings.local_dbt_enabled(),
            is_authenticated,
            requires_org_registration: !has_orgs,
            site_url: self.settings.site_url.clone(),
            pylon: PylonState::default(),
        })
    }

    fn pylon_state(&self, user: Option<&SessionUser>) -> PylonState {
        let email = user.and_then(|user| user.email.as_deref());
        PylonState {
            app_id: self.settings.pylon_app_id.clone(),
            verification_hash: pylon_verification_hash(
                self.settings.pylon_identity_verification_secret.as_deref(),
                email,
            ),
        }
    }
}

/// Hex HMAC-SHA256 of `email`, keyed with the hex-decoded secret.
///
/// Returns `None` when either input is missing or empty. A secret with
/// trailing non-hex characters or an odd length is decoded up to its last
/// complete hex pair, and the misconfiguration is logged at `error!`.
pub fn pylon_verification_hash(secret_hex: Option<&str>, email: Option<&str>) -> Option<String> {
    let secret_hex = secret_hex.filter(|secret| !secret.is_empty())?;
    let email = email.filter(|email| !email.is_empty())?;

    let valid_len = hex_prefix_len(secret_hex);
    if valid_len < secret_hex.len() {
        error!(
            secret_len = secret_hex.len(),
            decoded_bytes = valid_len / 2,
            "Pylon identity verification secret is not valid hex; using its valid prefix"
        );
    }
    let key = hex::decode(&secret_hex[..valid_len]).ok()?;

    let mut mac = HmacSha256::new_from_slice(&key).ok()?;
    mac.update(email.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Length of the leading run of complete hex pairs.
fn hex_prefix_len(value: &str) -> usize {
    value
        .as_bytes()
        .chunks_exact(2)
        .take_while(|pair| pair.iter().all(u8::is_ascii_hexdigit))
        .count()
        * 2
}

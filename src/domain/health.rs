//! Instance health snapshot and its inputs.

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::cache::Overlay;
use crate::domain::types::Mode;

/// Authenticated caller, as established by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_uuid: Uuid,
    pub email: Option<String>,
}

/// Schema migration status reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Negative when migrations are pending, positive when the database has
    /// migrations unknown to this build.
    pub status: i32,
    pub current_version: Option<String>,
}

impl MigrationStatus {
    pub fn in_sync(current_version: impl Into<String>) -> Self {
        Self {
            status: 0,
            current_version: Some(current_version.into()),
        }
    }

    /// Database schema relative to the running code.
    pub fn drift(&self) -> Ordering {
        self.status.cmp(&0)
    }
}

/// Support widget identity fields. Recomputed for every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PylonState {
    pub app_id: Option<String>,
    pub verification_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthState {
    pub healthy: bool,
    pub mode: Mode,
    pub version: String,
    pub local_dbt_enabled: bool,
    pub is_authenticated: bool,
    pub requires_org_registration: bool,
    pub site_url: String,
    pub pylon: PylonState,
}

impl Overlay for HealthState {
    type Fields = PylonState;

    fn apply_overlay(&mut self, fields: PylonState) {
        self.pylon = fields;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_follows_status_sign() {
        let behind = MigrationStatus {
            status: -2,
            current_version: None,
        };
        let ahead = MigrationStatus {
            status: 1,
            current_version: None,
        };
        assert_eq!(behind.drift(), Ordering::Less);
        assert_eq!(ahead.drift(), Ordering::Greater);
        assert_eq!(MigrationStatus::in_sync("42").drift(), Ordering::Equal);
    }

    #[test]
    fn overlay_replaces_pylon_only() {
        let mut state = HealthState {
            healthy: true,
            mode: Mode::Default,
            version: "1.0.0".to_string(),
            local_dbt_enabled: true,
            is_authenticated: true,
            requires_org_registration: false,
            site_url: "http://localhost:8080".to_string(),
            pylon: PylonState::default(),
        };

        state.apply_overlay(PylonState {
            app_id: Some("app".to_string()),
            verification_hash: Some("hash".to_string()),
        });

        assert_eq!(state.pylon.verification_hash.as_deref(), Some("hash"));
        assert!(state.is_authenticated);
    }

    #[test]
    fn health_state_serializes_camel_case() {
        let state = HealthState {
            healthy: true,
            mode: Mode::CloudBeta,
            version: "1.0.0".to_string(),
            local_dbt_enabled: false,
            is_authenticated: false,
            requires_org_registration: true,
            site_url: "https://example.test".to_string(),
            pylon: PylonState::default(),
        };
        let value = serde_json::to_value(&state).expect("serialize health");
        assert_eq!(value["requiresOrgRegistration"], serde_json::json!(true));
        assert_eq!(value["mode"], serde_json::json!("cloud_beta"));
        assert!(value["pylon"]["verificationHash"].is_null());
    }
}

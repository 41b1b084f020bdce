use axum::Json;
use axum::extract::{Extension, Path, State};

use uuid::Uuid;

use crate::application::error::AppError;
use crate::domain::health::{HealthState, SessionUser};
use crate::domain::query_history::CacheHit;

use super::ApiState;

pub async fn get_health(
    State(state): State<ApiState>,
    user: Option<Extension<SessionUser>>,
) -> Result<Json<HealthState>, AppError> {
    let user = user.map(|Extension(user)| user);
    let health = state.health.health_state(user.as_ref()).await?;
    Ok(Json(health))
}

pub async fn get_cached_results(
    State(state): State<ApiState>,
    Path((project_uuid, cache_key)): Path<(Uuid, String)>,
) -> Result<Json<CacheHit>, AppError> {
    state
        .results
        .find_cached_results(project_uuid, &cache_key)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

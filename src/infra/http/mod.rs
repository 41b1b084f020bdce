mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::health::HealthService;
use crate::application::results_cache::ResultsCacheService;

#[derive(Clone)]
pub struct ApiState {
    pub health: Arc<HealthService>,
    pub results: Arc<ResultsCacheService>,
}

/// JSON API router. Session users are expected as a request extension
/// installed by an outer authentication layer.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::get_health))
        .route(
            "/api/v1/projects/{project_uuid}/results/{cache_key}",
            get(handlers::get_cached_results),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

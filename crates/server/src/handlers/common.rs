//! Shared handlers.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use hondana_metadata::MetadataStore;
use hondana_storage::ObjectStore;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage_backend: &'static str,
}

/// GET /v1/health - liveness probe.
///
/// Intentionally unauthenticated for load balancers and probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.metadata.health_check().await?;
    state.storage.health_check().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        storage_backend: state.storage.backend_name(),
    }))
}

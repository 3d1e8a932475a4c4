//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for probes)
        .route("/v1/health", get(handlers::health_check))
        // Ingestion gateway (shared-secret header checked in the handler)
        .route("/v1/ingest/webhook", post(handlers::ingest_webhook))
        // Cache-check read path; Accept header selects JSON vs event stream
        .route(
            "/v1/series/{slug}/chapters/{number}",
            get(handlers::read_chapter),
        )
        // Cached-object serving
        .route("/v1/cache/{*key}", get(handlers::get_cached_object))
        // Admin deletion (bearer token checked in the handlers)
        .route(
            "/v1/admin/chapters/{chapter_id}",
            delete(handlers::delete_chapter),
        )
        .route(
            "/v1/admin/series/{series_id}",
            delete(handlers::delete_series),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Cached-object serving.
//!
//! Serves page objects and manifests straight from the object cache, for
//! deployments where no CDN fronts the store. Manifest URLs resolve here.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use hondana_storage::ObjectStore;

/// GET /v1/cache/{*key} - serve a cached object.
pub async fn get_cached_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let object = match state.storage.get(&key).await {
        Ok(object) => object,
        Err(e) if e.is_not_found() => {
            return Err(ApiError::NotFound(format!("no cached object: {key}")));
        }
        Err(e) => return Err(e.into()),
    };

    let mut headers = HeaderMap::new();
    if let Some(value) = object
        .meta
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Some(value) = object
        .meta
        .cache_control
        .as_deref()
        .and_then(|cc| HeaderValue::from_str(cc).ok())
    {
        headers.insert(CACHE_CONTROL, value);
    }

    Ok((headers, object.bytes).into_response())
}

//! Request authentication.
//!
//! Two credentials exist: the webhook shared secret presented by the
//! messaging platform, and the admin bearer token for deletion endpoints.
//! Neither lives in the database; both come from configuration.

use crate::error::{ApiError, ApiResult};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use hondana_core::config::{AdminConfig, UpstreamConfig};
use sha2::{Digest, Sha256};

/// Header the platform sends its shared secret in.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Verify the webhook shared secret.
///
/// A request without a valid credential is rejected before any side
/// effects.
pub fn verify_webhook_secret(headers: &HeaderMap, config: &UpstreamConfig) -> ApiResult<()> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(secret) if secret == config.webhook_secret => Ok(()),
        _ => Err(ApiError::Unauthorized(
            "missing or invalid webhook secret".to_string(),
        )),
    }
}

/// Require a valid admin bearer token.
pub fn require_admin(headers: &HeaderMap, config: &AdminConfig) -> ApiResult<()> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    if hash_token(token) != config.token_hash {
        return Err(ApiError::Unauthorized("invalid admin token".to_string()));
    }
    Ok(())
}

/// Extract bearer token from the Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Hash a token for comparison against the configured hash.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

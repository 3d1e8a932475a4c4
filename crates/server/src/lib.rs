//! Hondana HTTP server.
//!
//! Wires the ingestion webhook, the cache-check read path (JSON and SSE),
//! cached-object serving, admin deletion, and the background page
//! materializer over the storage/metadata/upstream seams.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod materialize;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, FlightRegistry};

//! Messaging-platform archive source client for Hondana.
//!
//! Resolves opaque archive references announced by the ingestion webhook to
//! downloadable files and retrieves them. The [`ArchiveSource`] trait is the
//! seam the materializer programs against.

pub mod error;
pub mod http;
pub mod source;

pub use error::{UpstreamError, UpstreamResult};
pub use http::BotApiSource;
pub use source::ArchiveSource;

use hondana_core::config::{ServerConfig, UpstreamConfig};
use std::sync::Arc;

/// Create an archive source from configuration.
pub fn from_config(
    upstream: &UpstreamConfig,
    server: &ServerConfig,
) -> UpstreamResult<Arc<dyn ArchiveSource>> {
    let source = BotApiSource::new(upstream, server.max_archive_bytes)?;
    Ok(Arc::new(source))
}

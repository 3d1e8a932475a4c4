//! The archive source seam.

use crate::error::UpstreamResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Resolves an opaque archive reference and retrieves the archive bytes.
///
/// The production implementation talks to the messaging platform's bot API;
/// tests substitute an in-memory source.
#[async_trait]
pub trait ArchiveSource: Send + Sync + 'static {
    /// Fetch the archive behind `archive_ref` in full.
    ///
    /// Fails without side effects when the reference cannot be resolved or
    /// the transfer does not complete.
    async fn fetch_archive(&self, archive_ref: &str) -> UpstreamResult<Bytes>;
}

//! The page manifest.
//!
//! A manifest is the persisted, ordered list of cached page URLs for one
//! chapter. Its presence in the object cache is the *sole* signal that
//! materialization completed; it is written once, strictly after every page
//! upload succeeded, and never partially. A reader that observes a manifest
//! is guaranteed every listed object exists.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Content type the manifest object is stored under.
pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

/// Ordered list of page URLs for a fully materialized chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageManifest {
    /// Page URLs sorted by page number ascending.
    #[serde(rename = "imageUrls")]
    pub image_urls: Vec<String>,
}

impl PageManifest {
    /// Serialize for the terminal cache write.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a cached manifest object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Number of pages the manifest lists.
    pub fn page_count(&self) -> usize {
        self.image_urls.len()
    }
}

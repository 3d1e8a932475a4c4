//! Core domain types for Hondana.
//!
//! This crate provides:
//! - Chapter and page number parsing from file names
//! - The cache key layout shared by the materializer and the read path
//! - The page manifest, the sole marker of complete materialization
//! - Archive page extraction
//! - Configuration types shared across crates

pub mod archive;
pub mod chapter;
pub mod config;
pub mod error;
pub mod key;
pub mod manifest;

pub use chapter::ChapterNumber;
pub use error::{Error, Result};
pub use manifest::PageManifest;

/// Default cap on a single decompressed archive entry (50 MiB).
pub const DEFAULT_MAX_PAGE_BYTES: u64 = 50 * 1024 * 1024;

/// Default cap on a downloaded archive (512 MiB).
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 512 * 1024 * 1024;

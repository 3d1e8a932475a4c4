//! Series and chapter metadata store for Hondana.
//!
//! This crate provides the control-plane data model:
//! - Series records keyed by the external platform's topic ID
//! - Chapter records with duplicate-delivery guards
//! - The live-chapter lookup the read path resolves requests against

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::{ChapterRepo, SeriesRepo};
pub use store::{MetadataStore, SqliteStore};

use hondana_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

//! HTTP request handlers.

pub mod admin;
pub mod cache;
pub mod common;
pub mod ingest;
pub mod read;

pub use admin::*;
pub use cache::*;
pub use common::*;
pub use ingest::*;
pub use read::*;

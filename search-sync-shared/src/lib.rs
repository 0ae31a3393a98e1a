//! # Search Sync Shared
//!
//! Shared value types for the search sync system: the per-entity
//! synchronization binding and the document representation that flows
//! between the store, the pipeline, and the search index.

pub mod binding;
pub mod document;

pub use binding::{ConfigError, EntityBinding, ID_FIELD};
pub use document::Document;

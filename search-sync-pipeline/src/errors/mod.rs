//! Error types for the search sync pipeline.

use search_sync_repository::{SearchError, StoreError};
use thiserror::Error;

/// Errors that can occur in the sync pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from the document store or a change feed.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

//! # Search Sync
//!
//! Main library for the store-to-search sync service.
//!
//! This crate provides the entry point and configuration for running the
//! streaming sync workers and the administrative reindex trigger.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] search_sync_pipeline::PipelineError),

    /// Search engine error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_sync_repository::SearchError),

    /// Document store error.
    #[error("Store error: {0}")]
    StoreError(#[from] search_sync_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<search_sync_shared::ConfigError> for SyncError {
    fn from(e: search_sync_shared::ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}

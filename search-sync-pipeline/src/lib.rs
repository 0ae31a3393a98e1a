//! # Search Sync Pipeline
//!
//! This crate provides the core of the change-data-capture sync system:
//! it keeps search indexes synchronized with their source tables, one
//! worker per configured entity binding.
//!
//! ## Architecture
//!
//! 1. **Decoder**: Turns raw change-feed records into typed change events
//! 2. **Writer**: Applies idempotent upserts/deletes to the search index
//! 3. **Reindex driver**: Destructive full rebuild of an index from its table
//! 4. **Worker**: Long-lived streaming sync loop per binding
//! 5. **Supervisor**: Owns the workers and the reindex trigger

pub mod decoder;
pub mod errors;
pub mod feed;
pub mod reindex;
pub mod supervisor;
pub mod worker;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::PipelineError;

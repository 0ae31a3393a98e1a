//! Search index client trait definition.
//!
//! This module defines the abstract interface for search engine
//! operations, allowing for different backend implementations
//! (OpenSearch, Elasticsearch, mocks for testing).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::SearchError;

/// Abstract interface for search engine operations.
///
/// All writes are idempotent point operations keyed by document id within
/// an index: `upsert` replaces any existing record wholesale (no
/// partial-field merge) and `delete` is a no-op for an absent id. The
/// document type label accompanies every write as category metadata; it is
/// not part of the record key since one binding targets exactly one index.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Create an index.
    ///
    /// Creating an index that already exists is treated as success, so a
    /// recreate racing another creator leaves the client usable.
    async fn create_index(&self, name: &str) -> Result<(), SearchError>;

    /// Delete an index. Absence of the index is not an error.
    async fn delete_index(&self, name: &str) -> Result<(), SearchError>;

    /// Insert or wholesale-replace the record for `id`.
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), SearchError>;

    /// Remove the record for `id`. Succeeds when the record is absent.
    async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<(), SearchError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}

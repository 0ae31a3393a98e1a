//! OpenSearch client implementation.
//!
//! Concrete [`SearchIndexClient`] backed by the OpenSearch Rust client.
//! Works against any OpenSearch/Elasticsearch-compatible HTTP endpoint.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts},
    DeleteParts, IndexParts, OpenSearch,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchIndexClient;

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200")?;
/// client.create_index("artists").await?;
/// client.upsert("artists", "artist", "a1", &body).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new client for the given OpenSearch URL.
    ///
    /// No network access occurs here; connectivity is verified lazily or
    /// via [`SearchIndexClient::health_check`].
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch client");

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }
}

#[async_trait]
impl SearchIndexClient for OpenSearchClient {
    /// Create an index with default settings.
    ///
    /// "Already exists" responses are treated as success so a concurrent
    /// or repeated create leaves the client usable.
    async fn create_index(&self, name: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                debug!(index = %name, "Index already exists");
                return Ok(());
            }
            error!(index = %name, status = %status, body = %body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "Create failed with status {}: {}",
                status, body
            )));
        }

        info!(index = %name, "Created index");
        Ok(())
    }

    /// Delete an index. A 404 is acceptable; the index may not exist.
    async fn delete_index(&self, name: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| SearchError::index_deletion(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            error!(index = %name, status = %status, body = %body, "Index deletion failed");
            return Err(SearchError::index_deletion(format!(
                "Delete failed with status {}: {}",
                status, body
            )));
        }

        info!(index = %name, "Deleted index");
        Ok(())
    }

    /// Insert or wholesale-replace a record via the index API.
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                index = %index,
                doc_type = %doc_type,
                doc_id = %id,
                status = %status,
                body = %error_body,
                "Upsert request failed"
            );
            return Err(SearchError::write(format!(
                "Upsert failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_type = %doc_type, doc_id = %id, "Document upserted");
        Ok(())
    }

    /// Delete a record. A 404 is acceptable; the record may not exist.
    async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchError::delete(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                index = %index,
                doc_type = %doc_type,
                doc_id = %id,
                status = %status,
                body = %error_body,
                "Delete request failed"
            );
            return Err(SearchError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_type = %doc_type, doc_id = %id, "Document deleted");
        Ok(())
    }

    /// Check cluster health; `red` counts as unhealthy.
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = body["status"].as_str().unwrap_or("red");
        Ok(status == "green" || status == "yellow")
    }
}

//! Document store REST gateway client.
//!
//! Implements [`TableScanner`] over the store's HTTP data-access gateway:
//! `GET {base}/api/v2/table/{path}?fields=...` returning a JSON
//! `DocumentStream` array. Change feeds are not served over this gateway;
//! they come from the Kafka-protocol feed source in the pipeline crate.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::TableScanner;
use search_sync_shared::Document;

/// Opaque credentials handed to the store gateway.
///
/// The pipeline never interprets these; identity handling is the store's
/// concern.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub username: String,
    pub password: String,
}

/// HTTP client for the document store's REST gateway.
pub struct RestStoreClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<StoreCredentials>,
}

impl RestStoreClient {
    /// Create a new gateway client. No network access occurs here.
    pub fn new(base_url: &str, credentials: Option<StoreCredentials>) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::connection(e.to_string()))?;

        info!(gateway = %base_url, "Created document store gateway client");

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
        })
    }

    /// Resolve the scan endpoint for a table path. Slashes in the path are
    /// part of the table name, not the route, so they are escaped.
    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        let escaped = table.replace('/', "%2F");
        self.base_url
            .join(&format!("api/v2/table/{}", escaped))
            .map_err(|e| StoreError::connection(e.to_string()))
    }
}

#[async_trait]
impl TableScanner for RestStoreClient {
    async fn scan(
        &self,
        table: &str,
        fields: &[String],
    ) -> Result<BoxStream<'static, Result<Document, StoreError>>, StoreError> {
        let url = self.table_url(table)?;

        let mut request = self.http.get(url);
        if !fields.is_empty() {
            request = request.query(&[("fields", fields.join(","))]);
        }
        if let Some(ref creds) = self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StoreError::auth(format!(
                "Gateway rejected credentials for table {}: {}",
                table, status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::scan(format!(
                "Scan of {} failed with status {}: {}",
                table, status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::scan(e.to_string()))?;

        let records = body["DocumentStream"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        debug!(table = %table, count = records.len(), "Scan returned documents");

        let table = table.to_string();
        let documents = records.into_iter().filter_map(move |record| {
            let Some(map) = record.as_object() else {
                warn!(table = %table, "Skipping non-object scan record");
                return None;
            };
            let doc = Document::from_record(map.clone());
            if doc.is_none() {
                warn!(table = %table, "Skipping scan record without id");
            }
            doc.map(Ok)
        });

        Ok(stream::iter(documents).boxed())
    }
}

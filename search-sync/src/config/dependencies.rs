//! Dependency initialization and wiring for the sync service.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::config::load_bindings;
use crate::SyncError;
use search_sync_pipeline::{
    feed::{KafkaFeedConfig, KafkaFeedSource},
    supervisor::Supervisor,
    writer::IndexWriter,
};
use search_sync_repository::{
    OpenSearchClient, RestStoreClient, SearchIndexClient, StoreCredentials,
};
use search_sync_shared::EntityBinding;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default changelog broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "search-sync";

/// Default document store gateway URL.
const DEFAULT_STORE_GATEWAY_URL: &str = "http://localhost:8243";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured supervisor ready to run.
    pub supervisor: Supervisor,
    /// The bindings the supervisor and reindex trigger operate on.
    pub bindings: Vec<EntityBinding>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: search engine URL (default: http://localhost:9200)
    /// - `KAFKA_BROKER`: changelog broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: consumer group ID (default: search-sync)
    /// - `STORE_GATEWAY_URL`: document store REST gateway (default: http://localhost:8243)
    /// - `STORE_USERNAME` / `STORE_PASSWORD`: gateway credentials (optional)
    /// - `BINDINGS_PATH`: JSON bindings file (optional, defaults built in)
    pub async fn new() -> Result<Self, SyncError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let kafka_broker =
            env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string());
        let kafka_group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| DEFAULT_KAFKA_GROUP_ID.to_string());
        let gateway_url = env::var("STORE_GATEWAY_URL")
            .unwrap_or_else(|_| DEFAULT_STORE_GATEWAY_URL.to_string());

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka_broker,
            kafka_group_id = %kafka_group_id,
            gateway_url = %gateway_url,
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(&opensearch_url)?;

        // Verify the search engine is reachable before starting workers
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| SyncError::config(format!("Search engine health check failed: {}", e)))?;
        if !healthy {
            return Err(SyncError::config("Search engine cluster is unhealthy"));
        }
        info!("Search engine connection verified");

        let credentials = match (env::var("STORE_USERNAME"), env::var("STORE_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(StoreCredentials { username, password }),
            _ => None,
        };
        let scanner = RestStoreClient::new(&gateway_url, credentials)?;

        let feeds = KafkaFeedSource::new(KafkaFeedConfig {
            brokers: kafka_broker,
            group_id: kafka_group_id,
        });

        let writer = IndexWriter::new(Arc::new(search_client));
        let supervisor = Supervisor::new(Arc::new(scanner), Arc::new(feeds), writer);

        let bindings = load_bindings()?;

        Ok(Self {
            supervisor,
            bindings,
        })
    }
}

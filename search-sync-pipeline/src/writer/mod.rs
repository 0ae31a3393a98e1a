//! Index writer.
//!
//! Wraps the search index client with bounded exponential-backoff retry
//! and exposes the operations the pipeline needs: per-document upsert and
//! delete, and the drop/create index reset used by full rebuilds. Every
//! operation is an independently idempotent point call, so retrying after
//! a partial failure is always safe.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::decoder::{ChangeEvent, ChangeOp};
use search_sync_repository::{SearchError, SearchIndexClient};
use search_sync_shared::{Document, EntityBinding};

/// Retry configuration for index writes.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Maximum number of retry attempts for failed operations.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

/// Writer that applies idempotent mutations to the search index.
#[derive(Clone)]
pub struct IndexWriter {
    client: Arc<dyn SearchIndexClient>,
    config: WriterConfig,
}

impl IndexWriter {
    /// Create a new writer with default retry configuration.
    pub fn new(client: Arc<dyn SearchIndexClient>) -> Self {
        Self::with_config(client, WriterConfig::default())
    }

    /// Create a new writer with custom retry configuration.
    pub fn with_config(client: Arc<dyn SearchIndexClient>, config: WriterConfig) -> Self {
        Self { client, config }
    }

    /// Apply a decoded change event for the given binding.
    #[instrument(skip(self, event), fields(index = %binding.index_name, doc_id = %event.id))]
    pub async fn apply(
        &self,
        binding: &EntityBinding,
        event: &ChangeEvent,
    ) -> Result<(), SearchError> {
        match &event.op {
            ChangeOp::Upsert(document) => self.upsert(binding, document).await,
            ChangeOp::Delete => self.delete(binding, &event.id).await,
        }
    }

    /// Insert or wholesale-replace one document, with retries.
    pub async fn upsert(
        &self,
        binding: &EntityBinding,
        document: &Document,
    ) -> Result<(), SearchError> {
        let body = document.index_body();
        self.with_retry("upsert", &document.id, || {
            self.client
                .upsert(&binding.index_name, &binding.doc_type, &document.id, &body)
        })
        .await
    }

    /// Remove one document, with retries. A no-op when the record is absent.
    pub async fn delete(&self, binding: &EntityBinding, id: &str) -> Result<(), SearchError> {
        self.with_retry("delete", id, || {
            self.client
                .delete(&binding.index_name, &binding.doc_type, id)
        })
        .await
    }

    /// Drop and recreate an index, with retries on each step.
    ///
    /// Absence of the index on drop is not an error, so a reset is safe to
    /// repeat after any partial failure.
    pub async fn reset_index(&self, name: &str) -> Result<(), SearchError> {
        self.with_retry("delete_index", name, || self.client.delete_index(name))
            .await?;
        self.with_retry("create_index", name, || self.client.create_index(name))
            .await
    }

    /// Run an operation with bounded exponential-backoff retry.
    ///
    /// Non-retryable errors are returned immediately.
    async fn with_retry<T, F, Fut>(
        &self,
        op: &str,
        target: &str,
        mut call: F,
    ) -> Result<T, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..=self.config.max_retries {
            match call().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(op = %op, target = %target, attempt = attempt, "Succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        debug!(op = %op, target = %target, error = %e, "Non-retryable error");
                        return Err(e);
                    }

                    // Don't wait after the last attempt
                    if attempt < self.config.max_retries {
                        warn!(
                            op = %op,
                            target = %target,
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay_ms,
                            error = %e,
                            "Operation failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SearchError::write(format!("{} failed with no attempts", op))))
    }
}

//! Reindex driver.
//!
//! Performs destructive full rebuilds: drop the index, recreate it, scan
//! the source table with the binding's projection, and upsert every
//! document. Bindings are processed sequentially to bound load on the
//! store and the engine during a rebuild; one binding's failure never
//! aborts the others.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info, instrument};

use crate::errors::PipelineError;
use crate::writer::IndexWriter;
use search_sync_repository::TableScanner;
use search_sync_shared::EntityBinding;

/// Summary of one binding's successful rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexStats {
    /// Number of documents upserted into the fresh index.
    pub indexed: usize,
}

/// Outcome of one binding within a `reindex_all` invocation.
#[derive(Debug)]
pub struct BindingOutcome {
    /// The binding's target index name.
    pub index_name: String,
    /// Result of the rebuild.
    pub result: Result<ReindexStats, PipelineError>,
}

/// Per-binding outcomes of a full `reindex_all` pass.
#[derive(Debug, Default)]
pub struct ReindexReport {
    pub outcomes: Vec<BindingOutcome>,
}

impl ReindexReport {
    /// Number of bindings that failed to rebuild.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .count()
    }

    /// Whether every binding rebuilt successfully.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Driver for full index rebuilds.
pub struct ReindexDriver {
    scanner: Arc<dyn TableScanner>,
    writer: IndexWriter,
}

impl ReindexDriver {
    /// Create a new driver over the given scanner and writer.
    pub fn new(scanner: Arc<dyn TableScanner>, writer: IndexWriter) -> Self {
        Self { scanner, writer }
    }

    /// Rebuild one binding's index from its source table.
    ///
    /// An empty source table yields an empty, successfully created index.
    /// Scan order is whatever the store delivers; the rebuild is
    /// destructive, not an incremental merge, so order does not matter.
    #[instrument(skip(self, binding), fields(index = %binding.index_name, table = %binding.source_table))]
    pub async fn reindex(&self, binding: &EntityBinding) -> Result<ReindexStats, PipelineError> {
        info!("Starting reindex");

        self.writer.reset_index(&binding.index_name).await?;

        let mut documents = self
            .scanner
            .scan(&binding.source_table, &binding.scan_fields())
            .await?;

        let mut indexed = 0;
        while let Some(document) = documents.next().await {
            let document = document?.projected(&binding.projected_fields);
            self.writer.upsert(binding, &document).await?;
            indexed += 1;
        }
        drop(documents);

        info!(indexed = indexed, "Reindex complete");
        Ok(ReindexStats { indexed })
    }

    /// Rebuild every binding, sequentially, collecting per-binding
    /// outcomes instead of stopping at the first failure.
    pub async fn reindex_all(&self, bindings: &[EntityBinding]) -> ReindexReport {
        let mut report = ReindexReport::default();

        for binding in bindings {
            let result = self.reindex(binding).await;
            if let Err(ref e) = result {
                error!(index = %binding.index_name, error = %e, "Reindex failed for binding");
            }
            report.outcomes.push(BindingOutcome {
                index_name: binding.index_name.clone(),
                result,
            });
        }

        report
    }
}

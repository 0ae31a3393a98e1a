//! Pipeline supervisor.
//!
//! Owns the set of streaming sync workers and exposes the reindex driver
//! as an on-demand operation. Workers are independent and isolated: a
//! faulted worker never stops its siblings.
//!
//! Reindex-vs-streaming policy: the supervisor keeps one `RwLock` gate
//! per index. Workers hold it for read while applying an event;
//! `reindex_all` holds it for write across a binding's rebuild, so
//! streaming writes for that index pause until the rebuild finishes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::reindex::{BindingOutcome, ReindexDriver, ReindexReport};
use crate::worker::{SyncWorker, WorkerConfig, WorkerState};
use crate::writer::IndexWriter;
use search_sync_repository::{ChangeFeedSource, TableScanner};
use search_sync_shared::EntityBinding;

/// Handle to one spawned worker.
struct WorkerHandle {
    index_name: String,
    state: watch::Receiver<WorkerState>,
    join: JoinHandle<()>,
}

/// Supervisor coordinating workers and reindex runs.
pub struct Supervisor {
    scanner: Arc<dyn TableScanner>,
    feeds: Arc<dyn ChangeFeedSource>,
    writer: IndexWriter,
    worker_config: WorkerConfig,
    shutdown_tx: broadcast::Sender<()>,
    gates: Mutex<HashMap<String, Arc<RwLock<()>>>>,
    workers: Vec<WorkerHandle>,
}

impl Supervisor {
    /// Create a supervisor over the given collaborators.
    pub fn new(
        scanner: Arc<dyn TableScanner>,
        feeds: Arc<dyn ChangeFeedSource>,
        writer: IndexWriter,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            scanner,
            feeds,
            writer,
            worker_config: WorkerConfig::default(),
            shutdown_tx,
            gates: Mutex::new(HashMap::new()),
            workers: Vec::new(),
        }
    }

    /// Override the worker retry policy.
    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker_config = config;
        self
    }

    /// The gate shared by the streaming and reindex paths for one index.
    fn gate(&self, index_name: &str) -> Arc<RwLock<()>> {
        self.gates
            .lock()
            .expect("gate registry poisoned")
            .entry(index_name.to_string())
            .or_default()
            .clone()
    }

    /// Launch one streaming sync worker per binding.
    pub fn start(&mut self, bindings: &[EntityBinding]) {
        for binding in bindings {
            let gate = self.gate(&binding.index_name);
            let (worker, state) = SyncWorker::with_config(
                binding.clone(),
                self.feeds.clone(),
                self.writer.clone(),
                gate,
                self.worker_config.clone(),
            );
            let join = tokio::spawn(worker.run(self.shutdown_tx.subscribe()));
            self.workers.push(WorkerHandle {
                index_name: binding.index_name.clone(),
                state,
                join,
            });
        }

        info!(workers = self.workers.len(), "Started streaming sync workers");
    }

    /// Request cancellation of all workers and wait for them to stop.
    pub async fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        info!("Stopping streaming sync workers");
        let _ = self.shutdown_tx.send(());

        for handle in self.workers.drain(..) {
            if handle.join.await.is_err() {
                warn!(index = %handle.index_name, "Worker task panicked");
            }
        }

        info!("All workers stopped");
    }

    /// Current state of every worker, for observability.
    pub fn worker_states(&self) -> Vec<(String, WorkerState)> {
        self.workers
            .iter()
            .map(|h| (h.index_name.clone(), *h.state.borrow()))
            .collect()
    }

    /// Run a full rebuild over all bindings, sequentially.
    ///
    /// Each binding's rebuild holds that index's write gate, pausing the
    /// corresponding streaming worker for the duration; other bindings
    /// keep streaming untouched. Failures are collected per binding.
    pub async fn reindex_all(&self, bindings: &[EntityBinding]) -> ReindexReport {
        let driver = ReindexDriver::new(self.scanner.clone(), self.writer.clone());
        let mut report = ReindexReport::default();

        for binding in bindings {
            let gate = self.gate(&binding.index_name);
            let _guard = gate.write().await;

            let result = driver.reindex(binding).await;
            report.outcomes.push(BindingOutcome {
                index_name: binding.index_name.clone(),
                result,
            });
        }

        report
    }
}

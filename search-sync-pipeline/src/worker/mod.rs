//! Streaming sync worker.
//!
//! One long-lived worker per entity binding: it subscribes to the
//! binding's change feed, decodes each record, and applies it to the
//! search index. The worker suspends while awaiting the next record and
//! while backing off, never busy-polls, and honors cooperative
//! cancellation at every suspension point.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, RwLock};
use tracing::{error, info, warn};

use crate::decoder::ChangeDecoder;
use crate::writer::IndexWriter;
use search_sync_repository::{ChangeFeed, ChangeFeedSource, RawChangeRecord};
use search_sync_shared::EntityBinding;

/// Observable state of a streaming sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Not running: either never started or cleanly cancelled.
    Stopped,
    /// Opening the change feed (including backoff between attempts).
    Subscribing,
    /// Live: pulling records and applying them.
    Streaming,
    /// Dead after an unrecoverable feed error; distinguishable from a
    /// clean stop.
    Faulted,
}

/// Subscription retry policy.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Retries after a failed feed subscription before faulting.
    pub max_subscribe_retries: u32,
    /// Initial backoff delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Backoff delay ceiling in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_subscribe_retries: 5,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 30_000,
        }
    }
}

enum StreamEnd {
    /// External cancellation; the worker should stop cleanly.
    Cancelled,
    /// The feed dropped or ended; worth resubscribing.
    Disconnected,
    /// Unrecoverable feed error.
    Fatal,
}

/// Outcome of one pull-and-apply step.
enum Step {
    Applied,
    Cancelled,
    Ended,
    Transient,
    Fatal,
}

/// Worker that keeps one index in sync with one change feed.
pub struct SyncWorker {
    binding: EntityBinding,
    feeds: Arc<dyn ChangeFeedSource>,
    writer: IndexWriter,
    decoder: ChangeDecoder,
    gate: Arc<RwLock<()>>,
    config: WorkerConfig,
    state_tx: watch::Sender<WorkerState>,
}

impl SyncWorker {
    /// Create a worker and the receiver observing its state.
    ///
    /// `gate` is the per-index lock shared with the reindex path: the
    /// worker holds it for read while applying an event, so a rebuild
    /// holding it for write pauses streaming writes to that index.
    pub fn new(
        binding: EntityBinding,
        feeds: Arc<dyn ChangeFeedSource>,
        writer: IndexWriter,
        gate: Arc<RwLock<()>>,
    ) -> (Self, watch::Receiver<WorkerState>) {
        Self::with_config(binding, feeds, writer, gate, WorkerConfig::default())
    }

    /// Create a worker with a custom retry policy.
    pub fn with_config(
        binding: EntityBinding,
        feeds: Arc<dyn ChangeFeedSource>,
        writer: IndexWriter,
        gate: Arc<RwLock<()>>,
        config: WorkerConfig,
    ) -> (Self, watch::Receiver<WorkerState>) {
        let decoder = ChangeDecoder::new(binding.projected_fields.clone());
        let (state_tx, state_rx) = watch::channel(WorkerState::Stopped);
        (
            Self {
                binding,
                feeds,
                writer,
                decoder,
                gate,
                config,
                state_tx,
            },
            state_rx,
        )
    }

    fn set_state(&self, state: WorkerState) {
        let _ = self.state_tx.send(state);
    }

    /// Run until cancelled or faulted.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            feed = %self.binding.change_feed,
            index = %self.binding.index_name,
            "Starting sync worker"
        );

        loop {
            self.set_state(WorkerState::Subscribing);
            let feed = match self.subscribe(&mut shutdown).await {
                Ok(Some(feed)) => feed,
                Ok(None) => {
                    info!(feed = %self.binding.change_feed, "Worker cancelled while subscribing");
                    self.set_state(WorkerState::Stopped);
                    return;
                }
                Err(()) => {
                    self.set_state(WorkerState::Faulted);
                    return;
                }
            };

            self.set_state(WorkerState::Streaming);
            match self.stream(feed, &mut shutdown).await {
                StreamEnd::Cancelled => {
                    info!(feed = %self.binding.change_feed, "Worker stopped");
                    self.set_state(WorkerState::Stopped);
                    return;
                }
                StreamEnd::Fatal => {
                    self.set_state(WorkerState::Faulted);
                    return;
                }
                StreamEnd::Disconnected => {
                    warn!(feed = %self.binding.change_feed, "Feed disconnected, resubscribing");
                }
            }
        }
    }

    /// Open the change feed with bounded backoff.
    ///
    /// `Ok(None)` means the worker was cancelled; `Err(())` that the
    /// retry budget was exhausted or the error was fatal.
    async fn subscribe(
        &self,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<Option<Box<dyn ChangeFeed>>, ()> {
        let mut delay_ms = self.config.initial_retry_delay_ms;

        for attempt in 0..=self.config.max_subscribe_retries {
            let open = tokio::select! {
                _ = shutdown.recv() => return Ok(None),
                result = self.feeds.open(&self.binding.change_feed) => result,
            };

            match open {
                Ok(feed) => return Ok(Some(feed)),
                Err(e) if e.is_fatal() => {
                    error!(feed = %self.binding.change_feed, error = %e, "Fatal subscription error");
                    return Err(());
                }
                Err(e) => {
                    if attempt < self.config.max_subscribe_retries {
                        warn!(
                            feed = %self.binding.change_feed,
                            attempt = attempt + 1,
                            max_retries = self.config.max_subscribe_retries,
                            delay_ms = delay_ms,
                            error = %e,
                            "Subscription failed, retrying"
                        );
                        tokio::select! {
                            _ = shutdown.recv() => return Ok(None),
                            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                        }
                        delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                    } else {
                        error!(
                            feed = %self.binding.change_feed,
                            error = %e,
                            "Subscription retries exhausted"
                        );
                    }
                }
            }
        }

        Err(())
    }

    /// Pull and apply records until the feed ends or the worker is
    /// cancelled. The whole pull-and-apply step is raced against the
    /// shutdown signal, so cancellation interrupts write-retry backoff
    /// and gate waits as well as the idle wait for the next record. The
    /// feed subscription is released on every exit path. An event
    /// interrupted mid-apply is redelivered by the at-least-once feed.
    async fn stream(
        &self,
        mut feed: Box<dyn ChangeFeed>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> StreamEnd {
        loop {
            let step = tokio::select! {
                _ = shutdown.recv() => Step::Cancelled,
                step = self.pull_and_apply(&mut feed) => step,
            };

            match step {
                Step::Applied => {}
                Step::Cancelled => {
                    feed.close().await;
                    return StreamEnd::Cancelled;
                }
                Step::Ended | Step::Transient => {
                    feed.close().await;
                    return StreamEnd::Disconnected;
                }
                Step::Fatal => {
                    feed.close().await;
                    return StreamEnd::Fatal;
                }
            }
        }
    }

    /// One streaming step: await the next record and apply it.
    async fn pull_and_apply(&self, feed: &mut Box<dyn ChangeFeed>) -> Step {
        match feed.next_record().await {
            Ok(Some(raw)) => {
                self.apply(&raw).await;
                Step::Applied
            }
            Ok(None) => Step::Ended,
            Err(e) if e.is_fatal() => {
                error!(feed = %self.binding.change_feed, error = %e, "Fatal feed error");
                Step::Fatal
            }
            Err(e) => {
                warn!(feed = %self.binding.change_feed, error = %e, "Feed error");
                Step::Transient
            }
        }
    }

    /// Decode and apply one record.
    ///
    /// A malformed record is skipped; a write that keeps failing after the
    /// writer's retries is logged as a dropped update. Neither terminates
    /// the worker: the feed delivers at least once, so a later correcting
    /// event can still arrive.
    async fn apply(&self, raw: &RawChangeRecord) {
        let event = match self.decoder.decode(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    feed = %self.binding.change_feed,
                    offset = raw.offset,
                    error = %e,
                    "Skipping malformed record"
                );
                return;
            }
        };

        let _guard = self.gate.read().await;
        if let Err(e) = self.writer.apply(&self.binding, &event).await {
            error!(
                index = %self.binding.index_name,
                doc_id = %event.id,
                error = %e,
                "Dropping update after exhausted retries"
            );
        }
    }
}

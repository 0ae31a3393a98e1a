//! Document store trait definitions.
//!
//! The pipeline consumes two capabilities of the source store: lazy
//! field-projected table scans (for full rebuilds) and per-table change
//! feeds (for streaming sync). They are split into separate traits so a
//! deployment can back them with different transports.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::StoreError;
use search_sync_shared::Document;

/// A raw record pulled from a change feed, not yet decoded.
#[derive(Debug, Clone)]
pub struct RawChangeRecord {
    /// The serialized changelog entry.
    pub payload: Vec<u8>,
    /// Position of the record within the feed, for logging.
    pub offset: i64,
}

/// Lazy, field-projected scans over source tables.
#[async_trait]
pub trait TableScanner: Send + Sync {
    /// Open a scan over `table`, restricted to `fields` (empty = all
    /// fields). Documents arrive in store order, which is not guaranteed
    /// stable across scans.
    async fn scan(
        &self,
        table: &str,
        fields: &[String],
    ) -> Result<BoxStream<'static, Result<Document, StoreError>>, StoreError>;
}

/// Opens change feeds by feed identifier.
#[async_trait]
pub trait ChangeFeedSource: Send + Sync {
    /// Subscribe to the feed. The returned feed preserves per-document
    /// order and delivers each record at least once.
    async fn open(&self, feed_id: &str) -> Result<Box<dyn ChangeFeed>, StoreError>;
}

/// An open subscription to one change feed.
///
/// The feed is potentially infinite; `next_record` suspends until a record
/// arrives, so callers never busy-poll.
#[async_trait]
pub trait ChangeFeed: Send {
    /// Pull the next raw record. `Ok(None)` means the feed was closed by
    /// the store.
    async fn next_record(&mut self) -> Result<Option<RawChangeRecord>, StoreError>;

    /// Release the subscription. Dropping the feed must also release it;
    /// `close` exists for deterministic teardown on cancellation paths.
    async fn close(&mut self);
}

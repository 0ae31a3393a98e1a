//! Kafka-protocol change feed.
//!
//! The source store exposes each table's changelog as a topic over the
//! Kafka wire protocol; this module implements [`ChangeFeedSource`] and
//! [`ChangeFeed`] on top of `rdkafka`. One consumer is created per feed so
//! each sync worker owns its subscription and can be cancelled
//! independently.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaError,
    message::Message,
    Offset, TopicPartitionList,
};
use tracing::{debug, info};

use search_sync_repository::{ChangeFeed, ChangeFeedSource, RawChangeRecord, StoreError};

/// Connection settings for the changelog cluster.
#[derive(Debug, Clone)]
pub struct KafkaFeedConfig {
    /// Broker addresses, comma-separated.
    pub brokers: String,
    /// Consumer group id shared by the sync workers.
    pub group_id: String,
}

/// Opens changelog subscriptions over the Kafka wire protocol.
pub struct KafkaFeedSource {
    config: KafkaFeedConfig,
}

impl KafkaFeedSource {
    /// Create a feed source. No connection is made until a feed is opened.
    pub fn new(config: KafkaFeedConfig) -> Self {
        Self { config }
    }
}

fn map_kafka_error(e: KafkaError) -> StoreError {
    use rdkafka::types::RDKafkaErrorCode::*;

    match e.rdkafka_error_code() {
        Some(
            SaslAuthenticationFailed
            | TopicAuthorizationFailed
            | GroupAuthorizationFailed
            | ClusterAuthorizationFailed,
        ) => StoreError::auth(e.to_string()),
        _ => StoreError::feed(e.to_string()),
    }
}

#[async_trait]
impl ChangeFeedSource for KafkaFeedSource {
    async fn open(&self, feed_id: &str) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.config.brokers)
            .set("group.id", &self.config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(map_kafka_error)?;

        consumer.subscribe(&[feed_id]).map_err(map_kafka_error)?;

        info!(
            feed = %feed_id,
            brokers = %self.config.brokers,
            group_id = %self.config.group_id,
            "Subscribed to change feed"
        );

        Ok(Box::new(KafkaChangeFeed {
            consumer,
            feed_id: feed_id.to_string(),
            pending_commit: None,
        }))
    }
}

/// Commit position acknowledging everything up to and including `offset`.
fn commit_list(topic: &str, partition: i32, offset: i64) -> Result<TopicPartitionList, StoreError> {
    let mut tpl = TopicPartitionList::new();
    tpl.add_partition_offset(topic, partition, Offset::Offset(offset + 1))
        .map_err(map_kafka_error)?;
    Ok(tpl)
}

/// An open changelog subscription.
pub struct KafkaChangeFeed {
    consumer: StreamConsumer,
    feed_id: String,
    /// Position of the last record handed out, committed only once the
    /// caller comes back for the next one.
    pending_commit: Option<(String, i32, i64)>,
}

#[async_trait]
impl ChangeFeed for KafkaChangeFeed {
    async fn next_record(&mut self) -> Result<Option<RawChangeRecord>, StoreError> {
        // The feed delivers at least once: a record's offset is committed
        // only when the caller pulls the next one, i.e. after the previous
        // record was fully applied. A crash in between replays it, and the
        // idempotent upsert absorbs the duplicate.
        if let Some((topic, partition, offset)) = self.pending_commit.take() {
            let tpl = commit_list(&topic, partition, offset)?;
            self.consumer
                .commit(&tpl, CommitMode::Async)
                .map_err(map_kafka_error)?;
        }

        loop {
            let message = self.consumer.recv().await.map_err(map_kafka_error)?;

            let Some(payload) = message.payload() else {
                debug!(feed = %self.feed_id, "Skipping record with empty payload");
                continue;
            };

            self.pending_commit = Some((
                message.topic().to_string(),
                message.partition(),
                message.offset(),
            ));

            return Ok(Some(RawChangeRecord {
                payload: payload.to_vec(),
                offset: message.offset(),
            }));
        }
    }

    async fn close(&mut self) {
        // Deliberately leaves any pending offset uncommitted: close can
        // race an interrupted apply, and replay is the safe side of
        // at-least-once.
        debug!(feed = %self.feed_id, "Releasing change feed subscription");
        self.consumer.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_list_acknowledges_through_given_offset() {
        let tpl = commit_list("/mapr_music_changelog:artists", 3, 41).unwrap();

        let elements = tpl.elements();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].topic(), "/mapr_music_changelog:artists");
        assert_eq!(elements[0].partition(), 3);
        assert_eq!(elements[0].offset(), Offset::Offset(42));
    }
}

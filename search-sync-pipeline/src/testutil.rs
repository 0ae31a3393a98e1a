//! In-memory fakes of the repository traits, shared by the pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};

use search_sync_repository::{
    ChangeFeed, ChangeFeedSource, RawChangeRecord, SearchError, SearchIndexClient, StoreError,
    TableScanner,
};
use search_sync_shared::{Document, EntityBinding};

pub fn artists_binding() -> EntityBinding {
    EntityBinding::new(
        "/apps/artists",
        "/mapr_music_changelog:artists",
        "artists",
        "artist",
        vec!["name".to_string()],
    )
    .unwrap()
}

pub fn albums_binding() -> EntityBinding {
    EntityBinding::new(
        "/apps/albums",
        "/mapr_music_changelog:albums",
        "albums",
        "album",
        vec!["name".to_string()],
    )
    .unwrap()
}

/// In-memory search index with scriptable upsert failures.
#[derive(Default)]
pub struct MockIndex {
    indexes: Mutex<HashMap<String, HashMap<String, Map<String, Value>>>>,
    failing_upserts: AtomicUsize,
    upsert_attempts: AtomicUsize,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` upserts fail with a retryable write error.
    pub fn fail_next_upserts(&self, n: usize) {
        self.failing_upserts.store(n, Ordering::SeqCst);
    }

    pub fn upsert_attempts(&self) -> usize {
        self.upsert_attempts.load(Ordering::SeqCst)
    }

    pub fn index_exists(&self, name: &str) -> bool {
        self.indexes.lock().unwrap().contains_key(name)
    }

    pub fn record(&self, index: &str, id: &str) -> Option<Map<String, Value>> {
        self.indexes.lock().unwrap().get(index)?.get(id).cloned()
    }

    pub fn record_count(&self, index: &str) -> usize {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl SearchIndexClient for MockIndex {
    async fn create_index(&self, name: &str) -> Result<(), SearchError> {
        self.indexes
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), SearchError> {
        self.indexes.lock().unwrap().remove(name);
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        _doc_type: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), SearchError> {
        self.upsert_attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_upserts.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_upserts.store(failing - 1, Ordering::SeqCst);
            return Err(SearchError::write("injected failure"));
        }

        self.indexes
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn delete(&self, index: &str, _doc_type: &str, id: &str) -> Result<(), SearchError> {
        if let Some(records) = self.indexes.lock().unwrap().get_mut(index) {
            records.remove(id);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

/// In-memory table scanner; tables can be scripted to fail on open.
#[derive(Default)]
pub struct MockScanner {
    tables: Mutex<HashMap<String, Vec<Document>>>,
    failing_tables: Mutex<HashMap<String, StoreError>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &str, id: &str, fields: Value) {
        let doc = Document::new(id, fields.as_object().unwrap().clone());
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(doc);
    }

    pub fn fail_table(&self, table: &str, error: StoreError) {
        self.failing_tables
            .lock()
            .unwrap()
            .insert(table.to_string(), error);
    }
}

#[async_trait]
impl TableScanner for MockScanner {
    async fn scan(
        &self,
        table: &str,
        fields: &[String],
    ) -> Result<BoxStream<'static, Result<Document, StoreError>>, StoreError> {
        if let Some(error) = self.failing_tables.lock().unwrap().get(table) {
            return Err(error.clone());
        }

        let projection: Vec<String> = fields
            .iter()
            .filter(|f| f.as_str() != search_sync_shared::ID_FIELD)
            .cloned()
            .collect();

        let docs: Vec<Result<Document, StoreError>> = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|doc| Ok(doc.projected(&projection)))
            .collect();

        Ok(stream::iter(docs).boxed())
    }
}

/// A change feed that replays a script, then either hangs (like a live
/// feed with no traffic) or reports end-of-stream.
pub struct ScriptedFeed {
    records: VecDeque<Result<RawChangeRecord, StoreError>>,
    hang_when_drained: bool,
    closed: Arc<AtomicBool>,
}

impl ScriptedFeed {
    pub fn new(
        records: Vec<Result<RawChangeRecord, StoreError>>,
        hang_when_drained: bool,
    ) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                records: records.into(),
                hang_when_drained,
                closed: closed.clone(),
            },
            closed,
        )
    }
}

#[async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn next_record(&mut self) -> Result<Option<RawChangeRecord>, StoreError> {
        match self.records.pop_front() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e),
            None => {
                if self.hang_when_drained {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
                Ok(None)
            }
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out scripted feeds (or scripted open failures) per feed id.
#[derive(Default)]
pub struct ScriptedFeedSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<ScriptedFeed, StoreError>>>>,
}

impl ScriptedFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_feed(&self, feed_id: &str, feed: ScriptedFeed) {
        self.scripts
            .lock()
            .unwrap()
            .entry(feed_id.to_string())
            .or_default()
            .push_back(Ok(feed));
    }

    pub fn push_open_error(&self, feed_id: &str, error: StoreError) {
        self.scripts
            .lock()
            .unwrap()
            .entry(feed_id.to_string())
            .or_default()
            .push_back(Err(error));
    }
}

#[async_trait]
impl ChangeFeedSource for ScriptedFeedSource {
    async fn open(&self, feed_id: &str) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(feed_id)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(feed)) => Ok(Box::new(feed)),
            Some(Err(e)) => Err(e),
            None => Err(StoreError::connection(format!(
                "no scripted feed left for {}",
                feed_id
            ))),
        }
    }
}

/// Serialize a changelog upsert entry the way the store emits it.
pub fn upsert_record(id: &str, value: Value) -> RawChangeRecord {
    RawChangeRecord {
        payload: serde_json::to_vec(
            &serde_json::json!({"_id": id, "op": "update", "value": value}),
        )
        .unwrap(),
        offset: 0,
    }
}

/// Serialize a changelog delete entry.
pub fn delete_record(id: &str) -> RawChangeRecord {
    RawChangeRecord {
        payload: serde_json::to_vec(&serde_json::json!({"_id": id, "op": "delete"})).unwrap(),
        offset: 0,
    }
}

/// A record no decoder can make sense of.
pub fn garbage_record() -> RawChangeRecord {
    RawChangeRecord {
        payload: b"{\"op\": \"update\"}".to_vec(),
        offset: 0,
    }
}

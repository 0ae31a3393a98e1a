//! Change event decoder.
//!
//! Turns raw change-feed records into normalized [`ChangeEvent`]s. The
//! store emits changelog entries as JSON with an `_id`, an `op` marker and,
//! for mutations, the post-change document under `value`:
//!
//! ```json
//! {"_id": "a1", "op": "update", "value": {"name": "Queen", "founded": 1970}}
//! ```

use serde_json::Value;
use thiserror::Error;

use search_sync_repository::RawChangeRecord;
use search_sync_shared::Document;

/// A record that could not be turned into a change event.
///
/// Malformed records are reported and skipped by callers; they never fault
/// a worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed record: {0}")]
pub struct MalformedRecord(pub String);

/// The mutation carried by a change event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOp {
    /// Insert or wholesale-replace the document.
    Upsert(Document),
    /// Remove the document from the index.
    Delete,
}

/// A normalized mutation decoded from the change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The affected document's id.
    pub id: String,
    /// What happened to it.
    pub op: ChangeOp,
}

/// Decoder for one binding's change feed.
///
/// Holds the binding's projection so upsert payloads are restricted to the
/// indexed fields; the document id is always retained since it is the
/// index key.
#[derive(Debug, Clone)]
pub struct ChangeDecoder {
    projection: Vec<String>,
}

impl ChangeDecoder {
    /// Create a decoder with the given projection (empty = all fields).
    pub fn new(projection: Vec<String>) -> Self {
        Self { projection }
    }

    /// Decode a raw feed record into a change event.
    pub fn decode(&self, record: &RawChangeRecord) -> Result<ChangeEvent, MalformedRecord> {
        let value: Value = serde_json::from_slice(&record.payload)
            .map_err(|e| MalformedRecord(format!("Invalid JSON payload: {}", e)))?;

        let entry = value
            .as_object()
            .ok_or_else(|| MalformedRecord("Record is not a JSON object".to_string()))?;

        let id = entry
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MalformedRecord("Record has no document id".to_string()))?
            .to_string();

        let op = entry
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| MalformedRecord("Record has no operation marker".to_string()))?;

        match op {
            "insert" | "update" | "replace" => {
                let fields = entry
                    .get("value")
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        MalformedRecord(format!("'{}' record has no document value", op))
                    })?
                    .clone();

                let document = Document::new(id.clone(), fields).projected(&self.projection);
                Ok(ChangeEvent {
                    id,
                    op: ChangeOp::Upsert(document),
                })
            }
            "delete" => Ok(ChangeEvent {
                id,
                op: ChangeOp::Delete,
            }),
            other => Err(MalformedRecord(format!(
                "Unknown operation marker '{}'",
                other
            ))),
        }
    }
}

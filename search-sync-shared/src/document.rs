//! Document representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::binding::ID_FIELD;

/// A document read from the source store or carried by a change event.
///
/// The id lives outside the field map; it is assigned by the source store
/// and is the key of the corresponding index record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable, store-assigned document identifier. Never empty.
    pub id: String,
    /// The document's fields, excluding the id.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document from an id and a field map. An `_id` entry in the
    /// map is folded into the id slot rather than kept as a field.
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a raw store record that carries its id as an
    /// `_id` field. Returns `None` when the record has no usable id.
    pub fn from_record(record: Map<String, Value>) -> Option<Self> {
        let id = record.get(ID_FIELD)?.as_str()?.to_string();
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id, record))
    }

    /// Restrict the document's fields to the given projection. An empty
    /// projection keeps all fields. The id is unaffected.
    pub fn projected(mut self, projection: &[String]) -> Self {
        if !projection.is_empty() {
            self.fields
                .retain(|key, _| projection.iter().any(|f| f == key));
        }
        self
    }

    /// The JSON body stored in the search index: all fields plus an `id`
    /// entry, so the key is queryable alongside the projected fields.
    pub fn index_body(&self) -> Map<String, Value> {
        let mut body = self.fields.clone();
        body.insert("id".to_string(), Value::String(self.id.clone()));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_from_record() {
        let record = fields(json!({"_id": "a1", "name": "Queen", "founded": 1970}));
        let doc = Document::from_record(record).unwrap();

        assert_eq!(doc.id, "a1");
        assert!(!doc.fields.contains_key("_id"));
        assert_eq!(doc.fields["name"], json!("Queen"));
    }

    #[test]
    fn test_from_record_without_id() {
        assert!(Document::from_record(fields(json!({"name": "Queen"}))).is_none());
        assert!(Document::from_record(fields(json!({"_id": ""}))).is_none());
        assert!(Document::from_record(fields(json!({"_id": 42}))).is_none());
    }

    #[test]
    fn test_projection_keeps_only_listed_fields() {
        let doc = Document::new(
            "a1",
            fields(json!({"name": "Queen", "founded": 1970})),
        )
        .projected(&["name".to_string()]);

        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields["name"], json!("Queen"));
    }

    #[test]
    fn test_empty_projection_keeps_all_fields() {
        let doc = Document::new(
            "a1",
            fields(json!({"name": "Queen", "founded": 1970})),
        )
        .projected(&[]);

        assert_eq!(doc.fields.len(), 2);
    }

    #[test]
    fn test_index_body_always_carries_id() {
        let doc = Document::new("a1", fields(json!({"name": "Queen"})));
        let body = doc.index_body();

        assert_eq!(body["id"], json!("a1"));
        assert_eq!(body["name"], json!("Queen"));
        assert_eq!(body.len(), 2);
    }
}

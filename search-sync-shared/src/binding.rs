//! Entity binding configuration.
//!
//! An [`EntityBinding`] declares one synchronization unit: which source
//! table and change feed to read, which index and document type to write,
//! and which fields to project into the index.

use serde::Deserialize;
use thiserror::Error;

/// The document id field as named by the source store.
///
/// Always retained in scans and projections since it is the index key.
pub const ID_FIELD: &str = "_id";

/// Errors raised when a binding is constructed from invalid values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required binding field was empty.
    #[error("Binding field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Static configuration linking one source table/changelog pair to one
/// destination index/type pair.
///
/// Immutable once constructed; construction validates that every
/// identifier is non-empty. An empty `projected_fields` means "index all
/// fields".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityBinding {
    /// Path of the source table in the document store (e.g. `/apps/artists`).
    pub source_table: String,
    /// Identifier of the table's change feed
    /// (e.g. `/mapr_music_changelog:artists`).
    pub change_feed: String,
    /// Name of the target search index.
    pub index_name: String,
    /// Document type/category label (e.g. `artist`).
    pub doc_type: String,
    /// Fields to project into the index; empty means all fields.
    #[serde(default)]
    pub projected_fields: Vec<String>,
}

impl EntityBinding {
    /// Create a validated binding.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyField`] if any identifier is empty or
    /// the projection contains an empty field name.
    pub fn new(
        source_table: impl Into<String>,
        change_feed: impl Into<String>,
        index_name: impl Into<String>,
        doc_type: impl Into<String>,
        projected_fields: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let binding = Self {
            source_table: source_table.into(),
            change_feed: change_feed.into(),
            index_name: index_name.into(),
            doc_type: doc_type.into(),
            projected_fields,
        };
        binding.validate()?;
        Ok(binding)
    }

    /// Re-validate a binding, e.g. after deserializing it from a config file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_table.is_empty() {
            return Err(ConfigError::EmptyField("source_table"));
        }
        if self.change_feed.is_empty() {
            return Err(ConfigError::EmptyField("change_feed"));
        }
        if self.index_name.is_empty() {
            return Err(ConfigError::EmptyField("index_name"));
        }
        if self.doc_type.is_empty() {
            return Err(ConfigError::EmptyField("doc_type"));
        }
        if self.projected_fields.iter().any(|f| f.is_empty()) {
            return Err(ConfigError::EmptyField("projected_fields"));
        }
        Ok(())
    }

    /// Fields to request from a table scan: the projection plus the id
    /// field. Empty when the binding projects all fields, which scanners
    /// interpret as an unrestricted scan.
    pub fn scan_fields(&self) -> Vec<String> {
        if self.projected_fields.is_empty() {
            return Vec::new();
        }
        let mut fields = self.projected_fields.clone();
        if !fields.iter().any(|f| f == ID_FIELD) {
            fields.push(ID_FIELD.to_string());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artists() -> EntityBinding {
        EntityBinding::new(
            "/apps/artists",
            "/mapr_music_changelog:artists",
            "artists",
            "artist",
            vec!["name".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_valid_binding() {
        let binding = artists();
        assert_eq!(binding.index_name, "artists");
        assert_eq!(binding.doc_type, "artist");
    }

    #[test]
    fn test_empty_fields_rejected() {
        let result = EntityBinding::new("", "feed", "idx", "doc", vec![]);
        assert_eq!(result, Err(ConfigError::EmptyField("source_table")));

        let result = EntityBinding::new("/t", "", "idx", "doc", vec![]);
        assert_eq!(result, Err(ConfigError::EmptyField("change_feed")));

        let result = EntityBinding::new("/t", "feed", "", "doc", vec![]);
        assert_eq!(result, Err(ConfigError::EmptyField("index_name")));

        let result = EntityBinding::new("/t", "feed", "idx", "", vec![]);
        assert_eq!(result, Err(ConfigError::EmptyField("doc_type")));
    }

    #[test]
    fn test_empty_projection_entry_rejected() {
        let result =
            EntityBinding::new("/t", "feed", "idx", "doc", vec![String::new()]);
        assert_eq!(result, Err(ConfigError::EmptyField("projected_fields")));
    }

    #[test]
    fn test_scan_fields_include_id() {
        let binding = artists();
        assert_eq!(binding.scan_fields(), vec!["name", "_id"]);
    }

    #[test]
    fn test_scan_fields_empty_for_full_projection() {
        let binding =
            EntityBinding::new("/t", "feed", "idx", "doc", vec![]).unwrap();
        assert!(binding.scan_fields().is_empty());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "source_table": "/apps/albums",
            "change_feed": "/mapr_music_changelog:albums",
            "index_name": "albums",
            "doc_type": "album",
            "projected_fields": ["name"]
        }"#;

        let binding: EntityBinding = serde_json::from_str(json).unwrap();
        binding.validate().unwrap();
        assert_eq!(binding.source_table, "/apps/albums");
        assert_eq!(binding.projected_fields, vec!["name"]);
    }
}

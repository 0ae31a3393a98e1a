//! Entity binding configuration loading.

use std::env;
use std::fs;

use tracing::info;

use crate::SyncError;
use search_sync_shared::EntityBinding;

/// Environment variable pointing at a JSON array of bindings.
const BINDINGS_PATH_VAR: &str = "BINDINGS_PATH";

/// Load the configured bindings.
///
/// When `BINDINGS_PATH` is set, bindings come from that JSON file and are
/// re-validated after deserialization. Otherwise the built-in defaults
/// mirror the original deployment: artists and albums tables, each
/// projecting only the `name` field.
pub fn load_bindings() -> Result<Vec<EntityBinding>, SyncError> {
    let bindings = match env::var(BINDINGS_PATH_VAR) {
        Ok(path) => {
            let raw = fs::read_to_string(&path)?;
            let bindings: Vec<EntityBinding> = serde_json::from_str(&raw)
                .map_err(|e| SyncError::config(format!("Invalid bindings file {}: {}", path, e)))?;
            for binding in &bindings {
                binding.validate()?;
            }
            info!(path = %path, count = bindings.len(), "Loaded bindings from file");
            bindings
        }
        Err(_) => default_bindings()?,
    };

    if bindings.is_empty() {
        return Err(SyncError::config("No bindings configured"));
    }
    Ok(bindings)
}

fn default_bindings() -> Result<Vec<EntityBinding>, SyncError> {
    let name_only = vec!["name".to_string()];
    Ok(vec![
        EntityBinding::new(
            "/apps/artists",
            "/mapr_music_changelog:artists",
            "artists",
            "artist",
            name_only.clone(),
        )?,
        EntityBinding::new(
            "/apps/albums",
            "/mapr_music_changelog:albums",
            "albums",
            "album",
            name_only,
        )?,
    ])
}

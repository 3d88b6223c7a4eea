//! Durable per-source manifest: document names, URLs, and content hashes.
//!
//! The manifest is the only durable state. It is read at the start of a run
//! and rewritten wholesale at the end if any document changed. Writes are
//! atomic: serialize to a .tmp sibling, then rename into place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One known document: where it came from and what its content hashed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub url: String,
    pub hash: String,
    pub last_fetched: DateTime<Utc>,
}

/// Per-source record of known documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub last_updated: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub documents: BTreeMap<String, DocumentRecord>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("manifest I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl Manifest {
    /// Load a manifest, or return an empty one when the file does not exist
    /// (first run).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write the manifest, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(e)
        })?;

        Ok(())
    }
}

/// Content-address hash of a document body, stable across runs for
/// identical content.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

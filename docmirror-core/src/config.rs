//! Source configuration: which sitemaps to mirror and where to put them.
//!
//! Sources are declared in a TOML file; per-source worker and retry
//! overrides fall back to [`SyncDefaults`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Process-level defaults for concurrency and retry settings, passed
/// explicitly into config loading and the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct SyncDefaults {
    pub max_workers: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for SyncDefaults {
    fn default() -> Self {
        Self {
            max_workers: 5,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// A configured documentation origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Name used to select this source on the command line.
    pub name: String,

    /// Sitemap URL listing the source's documents.
    pub sitemap: String,

    /// Substring a URL must contain to be mirrored; also the split point
    /// for document name derivation.
    pub url_pattern: String,

    /// Directory document files are written under.
    pub output_dir: PathBuf,

    /// Path of this source's manifest file.
    pub manifest_file: PathBuf,

    /// Fetch the markdown rendition (document URL with `.md` appended).
    /// Sources with this disabled are discovered but not mirrored.
    #[serde(default = "default_fetch_markdown")]
    pub fetch_markdown: bool,

    /// Per-source worker pool override.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Per-source retry override.
    #[serde(default)]
    pub max_retries: Option<u32>,
}

fn default_fetch_markdown() -> bool {
    true
}

impl Source {
    pub fn workers(&self, defaults: &SyncDefaults) -> usize {
        self.max_workers.unwrap_or(defaults.max_workers).max(1)
    }

    pub fn retries(&self, defaults: &SyncDefaults) -> u32 {
        self.max_retries.unwrap_or(defaults.max_retries)
    }
}

/// Top-level shape of the sources config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load the source list from a TOML config file.
pub fn load_sources(path: &Path) -> Result<Vec<Source>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let file: SourcesFile = toml::from_str(&text)?;
    Ok(file.sources)
}

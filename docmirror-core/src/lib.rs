//! docmirror core: sitemap-driven documentation mirroring with hash-based
//! change detection.
//!
//! The pipeline, leaf first:
//! - Retry-wrapped fetcher (bounded attempts, exponential backoff)
//! - Sitemap resolver (namespaced or bare `loc` extraction)
//! - URL filter and document name derivation
//! - Durable per-source manifest (JSON, atomic rewrite)
//! - Change-detection engine (new / unchanged / updated / removed)
//! - Parallel orchestrator (bounded worker pool, locked manifest updates)

pub mod config;
pub mod fetch;
pub mod manifest;
pub mod naming;
pub mod sitemap;
pub mod sync;

pub use config::{load_sources, ConfigError, Source, SourcesFile, SyncDefaults};
pub use fetch::{with_retry, DocumentFetcher, FetchError, HttpFetcher, RetryPolicy};
pub use manifest::{content_hash, DocumentRecord, Manifest, StoreError};
pub use sync::{
    check_source, sync_source, ChangeReport, DocStatus, NullProgress, PlainProgress, SyncError,
    SyncOptions, SyncProgress, SyncReport, SyncStats,
};

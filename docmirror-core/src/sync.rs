//! Change detection and the parallel per-document sync pipeline.
//!
//! One call to [`sync_source`] processes one configured source: resolve the
//! sitemap, derive document names, fetch and classify every candidate across
//! a bounded worker pool, then persist the manifest once if anything changed.
//! Per-document failures are tallied, never escalated; a failing document
//! cannot block or cancel its siblings.

use crate::config::{Source, SyncDefaults};
use crate::fetch::DocumentFetcher;
use crate::manifest::{content_hash, DocumentRecord, Manifest, StoreError};
use crate::{naming, sitemap};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Run modes for one sync pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Re-fetch every candidate regardless of stored hash.
    pub force: bool,
    /// Classify and report without writing documents or the manifest.
    pub dry_run: bool,
    /// Per-document status lines.
    pub verbose: bool,
}

/// Outcome of one document's fetch-and-classify step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStatus {
    Updated,
    Unchanged,
    WouldUpdate,
    Failed,
}

/// Per-source tally of document outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl SyncStats {
    fn record(&mut self, status: DocStatus) {
        match status {
            DocStatus::Updated | DocStatus::WouldUpdate => self.updated += 1,
            DocStatus::Unchanged => self.unchanged += 1,
            DocStatus::Failed => self.failed += 1,
        }
    }

    /// Fold another source's tally into a run total.
    pub fn add(&mut self, other: SyncStats) {
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

/// Result of syncing one source.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub stats: SyncStats,
    /// Names present in the manifest but absent from the current sitemap.
    /// Informational only; entries are never purged from the manifest.
    pub removed: Vec<String>,
}

/// Result of a check-only pass over one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub new: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write document {path}: {source}")]
    WriteDocument {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress callback invoked by the orchestrator, once per completed
/// document. Rich rendering is a presentation concern; the two built-in
/// implementations are plain text and a no-op.
pub trait SyncProgress: Send + Sync {
    fn advance(&self, n: usize);
    fn done(&self);
}

/// Silent progress sink.
pub struct NullProgress;

impl SyncProgress for NullProgress {
    fn advance(&self, _n: usize) {}
    fn done(&self) {}
}

/// Plain-text progress: counts completions, prints one line at the end.
pub struct PlainProgress {
    label: String,
    count: AtomicUsize,
}

impl PlainProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: AtomicUsize::new(0),
        }
    }
}

impl SyncProgress for PlainProgress {
    fn advance(&self, n: usize) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    fn done(&self) {
        println!(
            "  {}: {} documents processed",
            self.label,
            self.count.load(Ordering::Relaxed)
        );
    }
}

/// One candidate document: URL, derived name, and the stored hash if the
/// manifest already knows it.
struct DocTask {
    url: String,
    name: String,
    existing_hash: Option<String>,
}

/// The URL actually fetched for a document: trailing slashes stripped,
/// `.md` appended.
fn markdown_url(url: &str) -> String {
    format!("{}.md", url.trim_end_matches('/'))
}

fn write_document(output_dir: &Path, name: &str, content: &str) -> Result<(), SyncError> {
    let path = output_dir.join(format!("{name}.md"));
    std::fs::write(&path, content).map_err(|e| SyncError::WriteDocument { path, source: e })
}

/// Fetch and classify one document.
///
/// Returns the status plus the new content hash when the document was
/// updated. Fetch failures become [`DocStatus::Failed`]; only persistence
/// failures propagate as errors.
fn process_document(
    fetcher: &dyn DocumentFetcher,
    task: &DocTask,
    output_dir: &Path,
    opts: &SyncOptions,
) -> Result<(DocStatus, Option<String>), SyncError> {
    // Known document, not forced: fetch to see whether the content moved.
    if !opts.force {
        if let Some(existing) = &task.existing_hash {
            let content = match fetcher.fetch(&markdown_url(&task.url)) {
                Ok(content) => content,
                Err(e) => {
                    if opts.verbose {
                        eprintln!("    Failed: {}: {e}", task.name);
                    }
                    return Ok((DocStatus::Failed, None));
                }
            };

            let new_hash = content_hash(&content);
            if &new_hash == existing {
                return Ok((DocStatus::Unchanged, None));
            }
            if opts.dry_run {
                return Ok((DocStatus::WouldUpdate, None));
            }
            write_document(output_dir, &task.name, &content)?;
            return Ok((DocStatus::Updated, Some(new_hash)));
        }
    }

    // New or forced.
    if opts.dry_run {
        return Ok((DocStatus::WouldUpdate, None));
    }

    let content = match fetcher.fetch(&markdown_url(&task.url)) {
        Ok(content) => content,
        Err(e) => {
            if opts.verbose {
                eprintln!("    Failed: {}: {e}", task.name);
            }
            return Ok((DocStatus::Failed, None));
        }
    };

    let new_hash = content_hash(&content);
    write_document(output_dir, &task.name, &content)?;
    Ok((DocStatus::Updated, Some(new_hash)))
}

/// Sync one source: resolve, classify, fetch in parallel, persist.
///
/// The manifest is persisted at most once, after all workers have joined,
/// and only when at least one document was updated in a non-dry run.
pub fn sync_source(
    fetcher: &dyn DocumentFetcher,
    source: &Source,
    defaults: &SyncDefaults,
    opts: &SyncOptions,
    progress: &dyn SyncProgress,
) -> Result<SyncReport, SyncError> {
    let mut manifest = Manifest::load(&source.manifest_file)?;
    manifest.source = Some(source.sitemap.clone());

    let urls = sitemap::resolve(fetcher, &source.sitemap);
    let matched = naming::filter_urls(&urls, &source.url_pattern);
    println!("  Found {} matching URLs", matched.len());

    let tasks: Vec<DocTask> = if source.fetch_markdown {
        matched
            .iter()
            .filter_map(|url| {
                let name = naming::document_name(url, &source.url_pattern)?;
                let existing_hash = manifest.documents.get(&name).map(|d| d.hash.clone());
                Some(DocTask {
                    url: url.clone(),
                    name,
                    existing_hash,
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    if tasks.is_empty() {
        return Ok(SyncReport::default());
    }

    let removed: Vec<String> = manifest
        .documents
        .keys()
        .filter(|known| !tasks.iter().any(|t| &t.name == *known))
        .cloned()
        .collect();

    if !opts.dry_run {
        std::fs::create_dir_all(&source.output_dir).map_err(|e| SyncError::CreateDir {
            path: source.output_dir.clone(),
            source: e,
        })?;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(source.workers(defaults))
        .build()
        .expect("failed to build worker pool");

    // Single mutation gate: workers serialize manifest inserts through this
    // lock, held only for the one insertion.
    let gate = Mutex::new(manifest);

    let results: Vec<Result<DocStatus, SyncError>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                let (status, new_hash) = process_document(fetcher, task, &source.output_dir, opts)?;

                if let Some(hash) = new_hash {
                    let mut m = gate.lock().unwrap();
                    m.documents.insert(
                        task.name.clone(),
                        DocumentRecord {
                            url: task.url.clone(),
                            hash,
                            last_fetched: Utc::now(),
                        },
                    );
                }

                if opts.verbose || (opts.dry_run && status == DocStatus::WouldUpdate) {
                    match status {
                        DocStatus::Unchanged => println!("    Unchanged: {}", task.name),
                        DocStatus::Updated => println!("    Updated: {}", task.name),
                        DocStatus::WouldUpdate => println!("    Would update: {}", task.name),
                        DocStatus::Failed => println!("    Failed: {}", task.name),
                    }
                }

                progress.advance(1);
                Ok(status)
            })
            .collect()
    });

    progress.done();

    let mut stats = SyncStats::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(status) => stats.record(status),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let mut manifest = gate.into_inner().unwrap();
    if !opts.dry_run && stats.updated > 0 {
        manifest.last_updated = Some(Utc::now());
        manifest.save(&source.manifest_file)?;
        println!("  Manifest updated: {}", source.manifest_file.display());
    }

    Ok(SyncReport { stats, removed })
}

/// Check one source without writing anything: report which documents are
/// new, changed, or removed relative to the manifest.
pub fn check_source(
    fetcher: &dyn DocumentFetcher,
    source: &Source,
    defaults: &SyncDefaults,
) -> Result<ChangeReport, StoreError> {
    let manifest = Manifest::load(&source.manifest_file)?;

    let urls = sitemap::resolve(fetcher, &source.sitemap);
    let matched = naming::filter_urls(&urls, &source.url_pattern);

    // name -> URL that derived it; first derivation wins
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    for url in &matched {
        if let Some(name) = naming::document_name(url, &source.url_pattern) {
            current.entry(name).or_insert_with(|| url.clone());
        }
    }

    let new: Vec<String> = current
        .keys()
        .filter(|name| !manifest.documents.contains_key(*name))
        .cloned()
        .collect();

    let removed: Vec<String> = manifest
        .documents
        .keys()
        .filter(|name| !current.contains_key(*name))
        .cloned()
        .collect();

    let to_check: Vec<(&String, &String, &String)> = current
        .iter()
        .filter_map(|(name, url)| {
            manifest
                .documents
                .get(name)
                .map(|record| (name, url, &record.hash))
        })
        .collect();

    let changed = if source.fetch_markdown && !to_check.is_empty() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(source.workers(defaults))
            .build()
            .expect("failed to build worker pool");

        let mut changed: Vec<String> = pool.install(|| {
            to_check
                .par_iter()
                .filter_map(|(name, url, old_hash)| match fetcher.fetch(&markdown_url(url)) {
                    Ok(content) if &content_hash(&content) != *old_hash => Some((*name).clone()),
                    _ => None,
                })
                .collect()
        });
        changed.sort();
        changed
    } else {
        Vec::new()
    };

    Ok(ChangeReport {
        new,
        changed,
        removed,
    })
}

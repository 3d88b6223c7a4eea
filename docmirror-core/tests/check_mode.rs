//! Integration tests for check mode: classification without mutation.

use docmirror_core::{
    check_source, sync_source, DocumentFetcher, FetchError, NullProgress, Source, SyncDefaults,
    SyncOptions,
};
use std::collections::HashMap;
use std::path::Path;

const SITEMAP_URL: &str = "https://ex.com/sitemap.xml";

struct MockFetcher {
    pages: HashMap<String, String>,
}

impl MockFetcher {
    fn new(urls: &[&str]) -> Self {
        let mut pages = HashMap::new();
        let mut body = String::from("<urlset>\n");
        for url in urls {
            body.push_str(&format!("  <url><loc>{url}</loc></url>\n"));
        }
        body.push_str("</urlset>\n");
        pages.insert(SITEMAP_URL.to_string(), body);
        Self { pages }
    }

    fn set_page(&mut self, url: &str, body: &str) {
        self.pages
            .insert(format!("{}.md", url.trim_end_matches('/')), body.to_string());
    }
}

impl DocumentFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

fn test_source(root: &Path) -> Source {
    Source {
        name: "example-docs".to_string(),
        sitemap: SITEMAP_URL.to_string(),
        url_pattern: "/docs/".to_string(),
        output_dir: root.join("out"),
        manifest_file: root.join("manifest.json"),
        fetch_markdown: true,
        max_workers: None,
        max_retries: None,
    }
}

fn defaults() -> SyncDefaults {
    SyncDefaults::default()
}

#[test]
fn first_check_reports_everything_as_new() {
    let dir = tempfile::tempdir().unwrap();
    let source = test_source(dir.path());

    let fetcher = MockFetcher::new(&[
        "https://ex.com/docs/intro",
        "https://ex.com/docs/setup",
    ]);

    let report = check_source(&fetcher, &source, &defaults()).unwrap();
    assert_eq!(report.new, vec!["intro".to_string(), "setup".to_string()]);
    assert!(report.changed.is_empty());
    assert!(report.removed.is_empty());
}

#[test]
fn check_classifies_new_changed_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let source = test_source(dir.path());

    // Seed a manifest by syncing intro + setup
    let mut fetcher = MockFetcher::new(&[
        "https://ex.com/docs/intro",
        "https://ex.com/docs/setup",
    ]);
    fetcher.set_page("https://ex.com/docs/intro", "# Intro\n");
    fetcher.set_page("https://ex.com/docs/setup", "# Setup\n");
    sync_source(
        &fetcher,
        &source,
        &defaults(),
        &SyncOptions::default(),
        &NullProgress,
    )
    .unwrap();

    // Sitemap now lists intro (changed) and extra (new); setup is gone
    let mut fetcher = MockFetcher::new(&[
        "https://ex.com/docs/intro",
        "https://ex.com/docs/extra",
    ]);
    fetcher.set_page("https://ex.com/docs/intro", "# Intro v2\n");
    fetcher.set_page("https://ex.com/docs/extra", "# Extra\n");

    let report = check_source(&fetcher, &source, &defaults()).unwrap();
    assert_eq!(report.new, vec!["extra".to_string()]);
    assert_eq!(report.changed, vec!["intro".to_string()]);
    assert_eq!(report.removed, vec!["setup".to_string()]);
}

#[test]
fn unchanged_content_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = test_source(dir.path());

    let mut fetcher = MockFetcher::new(&["https://ex.com/docs/intro"]);
    fetcher.set_page("https://ex.com/docs/intro", "# Intro\n");
    sync_source(
        &fetcher,
        &source,
        &defaults(),
        &SyncOptions::default(),
        &NullProgress,
    )
    .unwrap();

    let report = check_source(&fetcher, &source, &defaults()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn check_never_touches_storage() {
    let dir = tempfile::tempdir().unwrap();
    let source = test_source(dir.path());

    let mut fetcher = MockFetcher::new(&["https://ex.com/docs/intro"]);
    fetcher.set_page("https://ex.com/docs/intro", "# Intro\n");

    let report = check_source(&fetcher, &source, &defaults()).unwrap();
    assert_eq!(report.new.len(), 1);

    assert!(!source.manifest_file.exists());
    assert!(!source.output_dir.exists());
}

#[test]
fn check_after_sync_leaves_manifest_bytes_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = test_source(dir.path());

    let mut fetcher = MockFetcher::new(&["https://ex.com/docs/intro"]);
    fetcher.set_page("https://ex.com/docs/intro", "# Intro\n");
    sync_source(
        &fetcher,
        &source,
        &defaults(),
        &SyncOptions::default(),
        &NullProgress,
    )
    .unwrap();
    let before = std::fs::read_to_string(&source.manifest_file).unwrap();

    fetcher.set_page("https://ex.com/docs/intro", "# Intro v2\n");
    let report = check_source(&fetcher, &source, &defaults()).unwrap();
    assert_eq!(report.changed, vec!["intro".to_string()]);

    let after = std::fs::read_to_string(&source.manifest_file).unwrap();
    assert_eq!(before, after);
}

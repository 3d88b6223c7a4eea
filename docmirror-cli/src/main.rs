//! docmirror CLI: sync and check commands.
//!
//! Commands:
//! - `sync` — fetch changed documents for one source or all of them
//! - `check` — report new/changed/removed documents without writing

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docmirror_core::{
    check_source, load_sources, sync_source, HttpFetcher, NullProgress, PlainProgress,
    RetryPolicy, Source, SyncDefaults, SyncOptions, SyncStats,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docmirror",
    about = "Mirror documentation sites from their sitemaps with hash-based change detection"
)]
struct Cli {
    /// Path to the sources config file.
    #[arg(long, global = true, default_value = "docmirror.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch changed documents and update manifests.
    Sync {
        /// Specific source to sync.
        #[arg(long, short)]
        source: Option<String>,

        /// Sync all configured sources.
        #[arg(long, short, default_value_t = false)]
        all: bool,

        /// Force re-fetch of all documents (ignore stored hashes).
        #[arg(long, short, default_value_t = false)]
        force: bool,

        /// Show what would be fetched without writing anything.
        #[arg(long, short = 'n', default_value_t = false)]
        dry_run: bool,

        /// Per-document status lines.
        #[arg(long, short, default_value_t = false)]
        verbose: bool,

        /// Override the worker pool size for every selected source.
        #[arg(long, short = 'w')]
        max_workers: Option<usize>,

        /// Override the retry attempt count for every selected source.
        #[arg(long, short = 'r')]
        max_retries: Option<u32>,

        /// Disable progress output.
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },
    /// Report new, changed, and removed documents without fetching to disk.
    Check {
        /// Specific source to check; all sources when omitted.
        #[arg(long, short)]
        source: Option<String>,

        /// Override the worker pool size.
        #[arg(long, short = 'w')]
        max_workers: Option<usize>,

        /// Override the retry attempt count.
        #[arg(long, short = 'r')]
        max_retries: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            source,
            all,
            force,
            dry_run,
            verbose,
            max_workers,
            max_retries,
            no_progress,
        } => run_sync(
            &cli.config,
            source,
            all,
            SyncOptions {
                force,
                dry_run,
                verbose,
            },
            max_workers,
            max_retries,
            no_progress,
        ),
        Commands::Check {
            source,
            max_workers,
            max_retries,
        } => run_check(&cli.config, source, max_workers, max_retries),
    }
}

fn defaults_with_overrides(max_workers: Option<usize>, max_retries: Option<u32>) -> SyncDefaults {
    let mut defaults = SyncDefaults::default();
    if let Some(workers) = max_workers {
        defaults.max_workers = workers;
    }
    if let Some(retries) = max_retries {
        defaults.max_retries = retries;
    }
    defaults
}

fn select_sources(sources: Vec<Source>, name: Option<&str>, all: bool) -> Result<Vec<Source>> {
    match name {
        Some(name) => {
            let selected: Vec<Source> =
                sources.into_iter().filter(|s| s.name == name).collect();
            if selected.is_empty() {
                bail!("source '{name}' not found in configuration");
            }
            Ok(selected)
        }
        None if all => Ok(sources),
        None => bail!("specify --source <name> or --all"),
    }
}

fn build_fetcher(source: &Source, defaults: &SyncDefaults) -> HttpFetcher {
    HttpFetcher::new(RetryPolicy {
        max_retries: source.retries(defaults),
        base_delay: defaults.retry_delay,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_sync(
    config: &PathBuf,
    source: Option<String>,
    all: bool,
    opts: SyncOptions,
    max_workers: Option<usize>,
    max_retries: Option<u32>,
    no_progress: bool,
) -> Result<()> {
    let defaults = defaults_with_overrides(max_workers, max_retries);
    let sources = load_sources(config).context("failed to load sources config")?;
    let selected = select_sources(sources, source.as_deref(), all)?;

    let mut total = SyncStats::default();

    for source in &selected {
        println!();
        println!("Processing: {}", source.name);
        println!("  Sitemap: {}", source.sitemap);
        println!("  Pattern: {}", source.url_pattern);
        println!("  Max workers: {}", source.workers(&defaults));

        let fetcher = build_fetcher(source, &defaults);

        let report = if no_progress || opts.verbose {
            sync_source(&fetcher, source, &defaults, &opts, &NullProgress)
        } else {
            let progress = PlainProgress::new(format!("Fetching {}", source.name));
            sync_source(&fetcher, source, &defaults, &opts, &progress)
        }
        .with_context(|| format!("sync failed for source '{}'", source.name))?;

        if !report.removed.is_empty() {
            println!("  Removed documents: {}", report.removed.join(", "));
        }
        total.add(report.stats);
    }

    println!();
    println!("{}", "=".repeat(50));
    println!("Summary:");
    println!("  Updated:   {}", total.updated);
    println!("  Unchanged: {}", total.unchanged);
    println!("  Failed:    {}", total.failed);

    if opts.dry_run {
        println!();
        println!("Dry run completed: no files were modified");
    }

    Ok(())
}

fn run_check(
    config: &PathBuf,
    source: Option<String>,
    max_workers: Option<usize>,
    max_retries: Option<u32>,
) -> Result<()> {
    let defaults = defaults_with_overrides(max_workers, max_retries);
    let sources = load_sources(config).context("failed to load sources config")?;
    let selected = select_sources(sources, source.as_deref(), true)?;

    for source in &selected {
        let fetcher = build_fetcher(source, &defaults);
        let report = check_source(&fetcher, source, &defaults)
            .with_context(|| format!("check failed for source '{}'", source.name))?;

        println!();
        println!("{}:", source.name);
        if !report.new.is_empty() {
            println!("  New documents: {}", report.new.join(", "));
        }
        if !report.changed.is_empty() {
            println!("  Changed documents: {}", report.changed.join(", "));
        }
        if !report.removed.is_empty() {
            println!("  Removed documents: {}", report.removed.join(", "));
        }
        if report.is_empty() {
            println!("  No updates needed");
        }
    }

    Ok(())
}

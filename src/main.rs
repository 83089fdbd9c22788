//! Case-Harvest main entry point
//!
//! This is the command-line interface for the case corpus harvester.

use anyhow::Context;
use case_harvest::config::{load_config_with_hash, Config};
use case_harvest::crawler::CrawlOrchestrator;
use case_harvest::ledger::IdentifierLedger;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Case-Harvest: a resumable legal case corpus harvester
///
/// Fetches case documents from a public repository by numeric identifier,
/// extracts judgment text and title, and appends each case to a plain-text
/// corpus file. Terminal outcomes are persisted so an interrupted run
/// resumes where it left off.
#[derive(Parser, Debug)]
#[command(name = "case-harvest")]
#[command(version = "0.1.0")]
#[command(about = "A resumable legal case corpus harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with_all = ["retry_only", "skip_retry"])]
    dry_run: bool,

    /// Only run the retry pass over previously failed identifiers
    #[arg(long, conflicts_with = "skip_retry")]
    retry_only: bool,

    /// Skip the retry pass after the range pass
    #[arg(long, conflicts_with = "retry_only")]
    skip_retry: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {config_hash})");

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let crawler = config.crawler.clone();
    let mut orchestrator = CrawlOrchestrator::new(config)?;

    if cli.retry_only {
        tracing::info!("Retry-only mode: skipping the range pass");
        orchestrator.retry_failed(crawler.max_retries).await?;
    } else if cli.skip_retry {
        orchestrator
            .run_range(crawler.start_id, crawler.end_id, crawler.batch_size)
            .await?;
    } else {
        orchestrator.run().await?;
    }

    let stats = orchestrator.stats();
    tracing::info!(
        "Harvest finished: {} added, {} empty, {} failed, {} skipped",
        stats.added,
        stats.empty,
        stats.failed,
        stats.skipped
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("case_harvest=info,warn"),
            1 => EnvFilter::new("case_harvest=debug,info"),
            2 => EnvFilter::new("case_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Case-Harvest Dry Run ===\n");

    println!("Range:");
    println!(
        "  Identifiers: {} to {}",
        config.crawler.start_id, config.crawler.end_id
    );
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Retry passes: {}", config.crawler.max_retries);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nSource:");
    println!("  Base URL: {}", config.source.base_url);

    println!("\nDelays:");
    println!(
        "  Request: {:.1}s to {:.1}s",
        config.delays.request_min, config.delays.request_max
    );
    println!(
        "  Nap: {:.0}% chance of {:.1}s to {:.1}s",
        config.delays.nap_chance * 100.0,
        config.delays.nap_min,
        config.delays.nap_max
    );
    println!(
        "  Batch break: {:.1}s to {:.1}s",
        config.delays.batch_break_min, config.delays.batch_break_max
    );

    println!("\nOutput:");
    println!("  Corpus: {}", config.output.corpus_path);
    println!("  Done ledger: {}", config.output.processed_path);
    println!("  Failed ledger: {}", config.output.failed_path);
    match &config.output.proxy_list_path {
        Some(path) => println!("  Proxy list: {}", path),
        None => println!("  Proxy list: none (direct connection)"),
    }

    // Consult the ledger so the pending count reflects a resumed run
    let ledger = IdentifierLedger::load(
        Path::new(&config.output.processed_path),
        Path::new(&config.output.failed_path),
    )?;
    let total = config.crawler.end_id - config.crawler.start_id + 1;
    let pending = (config.crawler.start_id..=config.crawler.end_id)
        .filter(|id| !ledger.is_resolved(*id))
        .count();

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch {} of {} identifiers ({} done, {} failed on record)",
        pending,
        total,
        ledger.done_count(),
        ledger.failed_count()
    );

    Ok(())
}

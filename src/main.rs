//! Match-Harvest main entry point
//!
//! This is the command-line interface for the match statistics harvester.

use anyhow::{bail, Context};
use clap::Parser;
use match_harvest::config::{load_config_with_hash, validate, Config};
use match_harvest::crawler::crawl;
use match_harvest::output::{load_statistics, print_statistics, print_summary, OutputStore};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Match-Harvest: an incremental match statistics harvester
///
/// Match-Harvest walks a paginated results listing in a real browser and
/// stores the per-player statistics of every match as one CSV file. Runs are
/// resumable: matches that already have a file are never fetched again.
#[derive(Parser, Debug)]
#[command(name = "match-harvest")]
#[command(version)]
#[command(about = "An incremental match statistics harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Stop once this many records exist
    #[arg(short, long, value_name = "N")]
    target: Option<usize>,

    /// Raw query string appended to every listing URL, e.g. "&stars=1"
    #[arg(long, value_name = "QUERY")]
    extra_query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("match_harvest=info,warn"),
            1 => EnvFilter::new("match_harvest=debug,info"),
            2 => EnvFilter::new("match_harvest=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }
    if let Some(target) = cli.target {
        config.crawl.target_matches = Some(target);
    }
    if let Some(extra_query) = &cli.extra_query {
        config.listing.extra_query = Some(extra_query.clone());
    }
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Match-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.root());
    println!("  Match path: /{}/", config.site.match_path);
    println!("  Stats link text: {:?}", config.site.stats_link_text);
    println!("  No-results marker: {}", config.site.no_results_selector);

    println!("\nListing:");
    println!("  First page: {}", config.listing_url(config.listing.start_offset));
    println!("  Page size: {}", config.listing.page_size);

    println!("\nCrawl:");
    match config.crawl.target_matches {
        Some(target) => println!("  Target: {} matches", target),
        None => println!("  Target: none (until the listing runs out)"),
    }
    println!(
        "  Consecutive empty pages before stopping: {}",
        config.crawl.consecutive_failure_threshold
    );
    println!("  Stop on exhausted listing: {}", config.crawl.stop_on_exhausted);
    println!("  Statistic tables: {:?}", config.crawl.table_indices);

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Backoff step: {}ms", config.retry.backoff_step_ms);
    println!("  Restart wait: {}ms", config.retry.restart_wait_ms);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable);
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the output directory
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Output directory: {}\n", config.output.directory);

    let store = OutputStore::new(&config.output.directory)
        .context("Failed to open output directory")?;
    let stats = load_statistics(&store).context("Failed to scan output directory")?;
    print_statistics(&stats);

    Ok(())
}

/// Exit code when a second interrupt aborts the crawl
const ABORT_EXIT_CODE: i32 = 130;

/// Cancels the crawl on the first interrupt
///
/// Returns true once a second interrupt arrives. Returns false if the signal
/// source fails.
async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut next_signal: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        return false;
    }
    tracing::warn!(
        "Interrupt received, stopping after the current page load (Ctrl-C again to abort)..."
    );
    cancel.cancel();

    if next_signal().await.is_err() {
        return false;
    }
    tracing::error!("Second interrupt received, aborting");
    true
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(interrupt, tokio::signal::ctrl_c).await {
            std::process::exit(ABORT_EXIT_CODE);
        }
    });

    let summary = crawl(config, cancel).await.context("Crawl failed to start")?;
    print_summary(&summary);

    if summary.stop_reason.is_error() {
        bail!("Crawl stopped: {}", summary.stop_reason);
    }
    Ok(())
}

//! Issue-Trawler main entry point
//!
//! This is the command-line interface for the Issue-Trawler crawler.

use anyhow::Context;
use clap::Parser;
use issue_trawler::config::{load_config_with_hash, Config};
use issue_trawler::crawler::{run_crawl, CrawlMode};
use issue_trawler::output::print_report;
use issue_trawler::TrawlError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Issue-Trawler: a paginated crawler for issue trackers and code review
///
/// Issue-Trawler walks Bugzilla bug listings and comments, or Gerrit change
/// queries per developer, to completion and writes every record to a SQLite
/// document store and/or flat files.
#[derive(Parser, Debug)]
#[command(name = "issue-trawler")]
#[command(version = "1.0.0")]
#[command(about = "A paginated issue-tracker crawler", long_about = None)]
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

    /// Crawl mode, overriding the configured one
    #[arg(long, value_parser = parse_mode)]
    mode: Option<CrawlMode>,

    /// Number of parallel workers, overriding the configured count
    #[arg(long)]
    workers: Option<usize>,

    /// Unit list file (JSON array or one unit per line) for the detail-only modes
    #[arg(long, value_name = "FILE")]
    units: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the document store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

fn parse_mode(value: &str) -> Result<CrawlMode, String> {
    value.parse::<CrawlMode>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(workers) = cli.workers {
        config.crawl.workers = workers;
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.mode)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, config_hash, cli.mode, cli.units.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("issue_trawler=info,warn"),
            1 => EnvFilter::new("issue_trawler=debug,info"),
            2 => EnvFilter::new("issue_trawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, mode: Option<CrawlMode>) -> anyhow::Result<()> {
    let mode = match mode {
        Some(mode) => mode,
        None => config.crawl.mode.parse::<CrawlMode>()?,
    };

    println!("=== Issue-Trawler Dry Run ===\n");

    println!("Source:");
    println!("  Kind: {:?}", config.source.kind);
    println!("  URL: {}", config.source.url);
    if let Some(params) = &config.source.further_params {
        println!("  Further params: {}", params);
    }
    println!("  Page size: {}", config.source.page_size);
    println!("  Start point increase: {}", config.source.start_point_increase);
    if let Some(before) = &config.source.before {
        println!("  Before: {}", before);
    }
    if let Some(after) = &config.source.after {
        println!("  After: {}", after);
    }
    if let Some(login) = &config.login {
        println!("  Login: {} as {}", login.url, login.name);
    }

    println!("\nCrawl:");
    println!("  Mode: {}", mode);
    println!("  Workers: {}", if mode.is_parallel() { config.crawl.workers } else { 1 });
    if let Some(units) = &config.crawl.units {
        println!("  Inline units: {}", units.len());
    }
    if let Some(path) = &config.crawl.unit_list {
        println!("  Unit list: {}", path.display());
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path.display()),
        None => println!("  Database: (disabled)"),
    }
    match &config.output.folder {
        Some(path) => println!("  Folder: {}", path.display()),
        None => println!("  Folder: (disabled)"),
    }
    println!("  Separator: {:?}", config.output.separator);
    println!("  Commit buckets: {}", config.output.commit_buckets);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the document store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use issue_trawler::output::{load_statistics, print_statistics};
    use issue_trawler::storage::open_store;

    let path = config
        .output
        .database_path
        .as_deref()
        .context("no database-path configured under [output]")?;

    println!("Database: {}\n", path.display());

    let store = open_store(path)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    mode: Option<CrawlMode>,
    units: Option<&Path>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {:?} source at {} with {} workers",
        config.source.kind,
        config.source.url,
        config.crawl.workers
    );

    match run_crawl(config, config_hash, mode, units).await {
        Ok(report) => {
            print_report(&report);
            if report.is_clean() {
                tracing::info!("Crawl completed successfully");
            } else {
                tracing::warn!("Crawl completed with failures");
            }
            Ok(())
        }
        Err(e) if e.is_missing_input() => {
            // Reported, not fatal
            println!("{}", e);
            Ok(())
        }
        Err(e) => {
            if let TrawlError::WorkerPanicked { partial, .. } = &e {
                print_report(partial);
            }
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

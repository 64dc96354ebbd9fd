//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner content harvester.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gleaner::config::{
    load_config_with_hash, validate_source_url, Config, Source, SourceRegistry, TomlConfigStore,
};
use gleaner::crawler::{scrape_source, CrawlPlan, Crawler, SourceScheduler};
use gleaner::output::list_documents;
use gleaner::state::LogProgress;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Gleaner: a content-harvesting web crawler
///
/// Gleaner renders pages, extracts their readable article or forum content
/// and stores one markdown document per harvested page. Registered sources
/// can be re-crawled on a schedule.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "A content-harvesting web crawler", long_about = None)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, value_name = "FILE", default_value = "gleaner.toml")]
    config: PathBuf,

    /// Path to the TOML file of registered sources
    #[arg(long, value_name = "FILE", default_value = "sources.toml")]
    sources: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a list of URLs once
    Crawl {
        /// Seed URLs to crawl
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// Maximum crawl depth (overrides the settings file)
        #[arg(long)]
        depth: Option<u32>,

        /// Skip pages published more than this many days ago (0 = unlimited)
        #[arg(long)]
        days_limit: Option<u32>,

        /// Seconds to wait between seed URLs
        #[arg(long, default_value_t = 2.0)]
        delay: f64,
    },

    /// Manage registered sources
    Sources {
        #[command(subcommand)]
        action: SourcesCommand,
    },

    /// Crawl one registered source now and record the crawl
    Scrape {
        /// URL of a registered source
        url: String,
    },

    /// Re-crawl registered sources on their intervals until Ctrl-C
    Schedule,

    /// List harvested documents, newest first
    Library,
}

#[derive(Subcommand, Debug)]
enum SourcesCommand {
    /// List registered sources
    List,

    /// Register a new source
    Add {
        url: String,

        /// Skip pages published more than this many days ago (0 = unlimited)
        #[arg(long)]
        days_limit: Option<u32>,

        /// Re-crawl every this many hours (0 or absent = manual only)
        #[arg(long)]
        interval_hours: Option<u32>,
    },

    /// Remove a registered source
    Remove { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_settings(&cli.config)?;
    let store = TomlConfigStore::new(&cli.config, &cli.sources);

    match cli.command {
        Command::Crawl {
            urls,
            depth,
            days_limit,
            delay,
        } => handle_crawl(config, urls, depth, days_limit, delay).await,
        Command::Sources { action } => handle_sources(SourceRegistry::new(store), action).await,
        Command::Scrape { url } => handle_scrape(config, SourceRegistry::new(store), url).await,
        Command::Schedule => handle_schedule(config, SourceRegistry::new(store)).await,
        Command::Library => handle_library(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
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

/// Loads the settings file, falling back to defaults when it does not exist
fn load_settings(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::info!("No settings file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Cancels the returned token on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current page");
            token.cancel();
        }
    });
    cancel
}

async fn launch_crawler(config: &Config) -> anyhow::Result<Crawler> {
    let crawler = Crawler::launch(&config.renderer).await;
    if !crawler.is_available() {
        bail!("no page renderer available");
    }
    Ok(crawler)
}

/// Handles the crawl command: each URL is crawled best-effort, in order
async fn handle_crawl(
    config: Config,
    urls: Vec<String>,
    depth: Option<u32>,
    days_limit: Option<u32>,
    delay: f64,
) -> anyhow::Result<()> {
    let crawler = launch_crawler(&config).await?;
    let cancel = cancel_on_interrupt();
    let delay = Duration::try_from_secs_f64(delay).context("invalid --delay")?;

    let mut plan = CrawlPlan::new(config.crawler.clone())
        .with_days_limit(days_limit)
        .with_cancellation(cancel.clone());
    if let Some(depth) = depth {
        plan = plan.with_max_depth(depth);
    }

    tracing::info!(
        "Crawling {} URL(s), max depth {}, output to {}",
        urls.len(),
        plan.max_depth,
        config.crawler.output_dir.display()
    );

    let mut succeeded = 0;
    for (index, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Err(e) = validate_source_url(url) {
            tracing::error!("Skipping {}: {}", url, e);
            continue;
        }

        let progress = LogProgress::new(url.as_str());
        match crawler.scrape(url, &plan, Some(&progress)).await {
            Some(path) => {
                succeeded += 1;
                println!("✓ {} -> {}", url, path.display());
            }
            None => println!("✗ {}", url),
        }
    }

    println!("\n{} of {} URL(s) produced a document", succeeded, urls.len());
    Ok(())
}

/// Handles the sources subcommands
async fn handle_sources(registry: SourceRegistry, action: SourcesCommand) -> anyhow::Result<()> {
    match action {
        SourcesCommand::List => {
            let sources = registry.list().await?;
            if sources.is_empty() {
                println!("No registered sources");
            }
            for source in sources {
                print_source(&source);
            }
        }
        SourcesCommand::Add {
            url,
            days_limit,
            interval_hours,
        } => {
            let source = Source {
                days_limit,
                interval_hours,
                ..Source::new(url)
            };
            registry.add(source.clone()).await?;
            println!("✓ Registered source");
            print_source(&source);
        }
        SourcesCommand::Remove { url } => {
            let removed = registry.remove(&url).await?;
            println!("✓ Removed {}", removed.url);
        }
    }
    Ok(())
}

fn print_source(source: &Source) {
    let days = match source.effective_days_limit() {
        Some(days) => format!("{} day(s)", days),
        None => "unlimited".to_string(),
    };
    let interval = match source.interval_hours.filter(|&h| h > 0) {
        Some(hours) => format!("every {}h", hours),
        None => "manual".to_string(),
    };
    let last = source
        .last_scraped
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("  - {}", source.url);
    println!("    Days limit: {}, schedule: {}, last scraped: {}", days, interval, last);
}

/// Handles the scrape command for one registered source
async fn handle_scrape(config: Config, registry: SourceRegistry, url: String) -> anyhow::Result<()> {
    let crawler = launch_crawler(&config).await?;
    let cancel = cancel_on_interrupt();
    let progress = LogProgress::new(url.as_str());

    let outcome = scrape_source(&crawler, &registry, &url, &cancel, Some(&progress)).await?;
    match outcome.document {
        Some(path) => {
            println!("✓ Scraped {} -> {}", url, path.display());
            Ok(())
        }
        None if outcome.only_outdated() => {
            println!("✓ Scraped {}: nothing within the days limit", url);
            Ok(())
        }
        None => bail!("scraping {} produced no document", url),
    }
}

/// Handles the schedule command: runs the source scheduler until Ctrl-C
async fn handle_schedule(config: Config, registry: SourceRegistry) -> anyhow::Result<()> {
    let crawler = Arc::new(launch_crawler(&config).await?);
    let poll_interval = Duration::from_secs(config.scheduler.poll_interval_seconds);

    let handle = SourceScheduler::new(crawler, registry, poll_interval).start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Stopping source scheduler");
    handle.stop().await;
    Ok(())
}

/// Handles the library command
fn handle_library(config: &Config) -> anyhow::Result<()> {
    let dir = &config.crawler.output_dir;
    let documents = list_documents(dir)
        .with_context(|| format!("failed to read documents in {}", dir.display()))?;

    println!("Library: {} ({} document(s))\n", dir.display(), documents.len());
    for doc in documents {
        println!("  - {}", doc.title);
        println!("    Source: {}", doc.source_url);
        println!(
            "    Scraped: {}, {} block(s), {}",
            doc.scraped_at.format("%Y-%m-%d %H:%M:%S"),
            doc.blocks,
            doc.path.display()
        );
    }
    Ok(())
}

//! sitewalk main entry point
//!
//! This is the command-line interface for the sitewalk same-origin crawler.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use sitewalk::config::{load_config_with_hash, Config};
use sitewalk::crawler::{CrawlOptions, CrawlReport, Crawler, HttpFetcher};
use sitewalk::output::{format_visit_report, print_statistics, write_csv_report};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// sitewalk: a same-origin web crawler
///
/// sitewalk crawls every page reachable from a seed URL without leaving the
/// seed's host, and writes one CSV row per page it could extract.
#[derive(Parser, Debug)]
#[command(name = "sitewalk")]
#[command(version)]
#[command(about = "A same-origin web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Maximum number of concurrent fetches (default 1)
    #[arg(value_name = "MAX_CONCURRENCY", allow_negative_numbers = true)]
    max_concurrency: Option<String>,

    /// Maximum number of distinct pages to crawl (default 1000)
    #[arg(value_name = "MAX_PAGES", allow_negative_numbers = true)]
    max_pages: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the CSV page report
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print how many internal links point at each page
    #[arg(long)]
    counts: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(seed) = cli.url.clone() else {
        println!("{}", Cli::command().render_usage());
        std::process::exit(1);
    };

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let options = CrawlOptions {
        max_concurrency: positive_or(
            cli.max_concurrency.as_deref(),
            config.crawler.max_concurrency,
        ),
        max_pages: positive_or(cli.max_pages.as_deref(), config.crawler.max_pages),
    };

    let report_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)
        .context("failed to build HTTP client")?;
    let crawler = Crawler::new(&seed, options, fetcher)
        .with_context(|| format!("invalid seed URL: {}", seed))?;

    let cancel = crawler.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight pages");
            cancel.trip();
        }
    });

    let report = crawler.crawl().await;
    finish(&cli, &report, &report_path)
}

/// Parses a positional limit, falling back to `default` for anything that
/// is not a positive integer
fn positive_or(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewalk=info,warn"),
            1 => EnvFilter::new("sitewalk=debug,info"),
            2 => EnvFilter::new("sitewalk=trace,debug"),
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

/// Writes the page report and prints the run summary
fn finish(cli: &Cli, report: &CrawlReport, report_path: &Path) -> anyhow::Result<()> {
    write_csv_report(&report.pages, report_path)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    tracing::info!(
        "Wrote {} pages to {}",
        report.pages.len(),
        report_path.display()
    );

    if cli.counts {
        print!("{}", format_visit_report(&report.base_url, &report.visits));
    }

    if !cli.quiet {
        print_statistics(&report.stats);
    }

    Ok(())
}

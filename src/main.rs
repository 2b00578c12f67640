//! Product-Scout main entry point
//!
//! This is the command-line interface for the Product-Scout sitemap crawler.

use anyhow::{bail, Context};
use clap::Parser;
use product_scout::config::{load_config, Config, SiteEntry};
use product_scout::crawler::crawl_sites;
use product_scout::output::{print_summary, ResultSink, TextFileSink};
use product_scout::url::Domain;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Product-Scout: sitemap-driven product URL discovery
///
/// Product-Scout reads each site's robots.txt, walks the sitemaps it names
/// and writes the product page URLs it finds to one text file per site.
#[derive(Parser, Debug)]
#[command(name = "product-scout")]
#[command(version = "1.0.0")]
#[command(about = "Sitemap-driven product URL discovery", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Crawl only this site instead of the configured ones (repeatable)
    #[arg(long = "site", value_name = "DOMAIN")]
    sites: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    if !cli.sites.is_empty() {
        for site in &cli.sites {
            Domain::parse(site).with_context(|| format!("Invalid --site value '{}'", site))?;
        }
        config.sites = cli
            .sites
            .iter()
            .map(|domain| SiteEntry {
                domain: domain.clone(),
            })
            .collect();
    }

    if config.sites.is_empty() {
        bail!("No sites to crawl: add [[site]] entries to the configuration or pass --site");
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(&config, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_scout=info,warn"),
            1 => EnvFilter::new("product_scout=debug,info"),
            2 => EnvFilter::new("product_scout=trace,debug"),
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
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Product-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max products per site: {}", config.crawler.max_products);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!("  Sitemap fallback: {}", config.crawler.sitemap_fallback);
    println!("  Inspect pages: {}", config.crawler.inspect_pages);
    println!(
        "  Retries: {} (delay {}ms)",
        config.fetcher.max_retries, config.fetcher.retry_delay_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    let sink = TextFileSink::new(&config.output.directory);
    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        let settings = config.crawl_settings(site)?;
        println!("  - {}", settings.domain);
        println!("    robots.txt: {}", settings.domain.robots_url());
        println!(
            "    output: {}",
            sink.path_for(&settings.domain).display()
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} site(s)", config.sites.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, quiet: bool) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with partial results");
            signal_token.cancel();
        }
    });

    tracing::info!("Crawling {} site(s)", config.sites.len());
    let outcomes = crawl_sites(config, &shutdown)
        .await
        .context("Crawl could not start")?;

    let sink = TextFileSink::new(&config.output.directory);
    let mut failed_writes = 0;
    for outcome in &outcomes {
        if let Err(e) = sink.persist(outcome) {
            tracing::error!("Failed to write results for {}: {}", outcome.domain, e);
            failed_writes += 1;
        }
        if !quiet {
            print_summary(outcome);
        }
    }

    let partial = outcomes.iter().filter(|o| !o.is_success()).count();
    tracing::info!(
        "Crawl finished: {} site(s), {} partial",
        outcomes.len(),
        partial
    );

    if failed_writes > 0 {
        bail!("Results for {} site(s) could not be written", failed_writes);
    }
    Ok(())
}

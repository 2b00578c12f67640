//! Crawler module for sitemap-driven product discovery
//!
//! This module contains the core crawling logic, including:
//! - The fetch capability and its HTTP implementation with retry logic
//! - Bounded fetch scheduling with cancellation
//! - HTML inspection of leaf pages
//! - Overall crawl control for one site

mod controller;
mod fetcher;
mod outcome;
mod parser;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::CrawlController;
pub use fetcher::{build_http_client, fetch_with_deadline, FetchResponse, Fetcher, HttpFetcher};
pub use outcome::{CrawlOutcome, CrawlStats, CrawlWarning, WarningKind};
pub use parser::{inspect_page, PageFindings};
pub use scheduler::{FetchOutcome, FetchScheduler, PendingFetch};

use crate::classifier::ProductClassifier;
use crate::config::Config;
use crate::ScoutError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Crawls every configured site concurrently
///
/// All crawls share one [`HttpFetcher`] (and so one connection pool); each
/// site gets its own [`CrawlController`].
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `shutdown` - Cancelling it ends every crawl early with a partial outcome
///
/// # Returns
///
/// * `Ok(Vec<CrawlOutcome>)` - One outcome per site, in configuration order
/// * `Err(ScoutError)` - The HTTP client or a site's settings could not be built
pub async fn crawl_sites(
    config: &Config,
    shutdown: &CancellationToken,
) -> Result<Vec<CrawlOutcome>, ScoutError> {
    let fetcher: Arc<dyn Fetcher> =
        Arc::new(HttpFetcher::from_config(&config.user_agent, &config.fetcher)?);
    let classifier = ProductClassifier::from_config(&config.classifier)?;

    let mut controllers = Vec::with_capacity(config.sites.len());
    for site in &config.sites {
        let settings = config.crawl_settings(site)?;
        controllers.push(
            CrawlController::new(settings, classifier.clone(), Arc::clone(&fetcher))
                .with_shutdown(shutdown.child_token()),
        );
    }

    Ok(futures::future::join_all(controllers.into_iter().map(CrawlController::run)).await)
}

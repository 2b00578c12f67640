//! Crawl controller - per-site crawl orchestration
//!
//! This module contains the loop that drives one site's crawl:
//! - Resolving sitemap roots from robots.txt (or the fallback location)
//! - Pulling candidates from the sitemap walker
//! - Classifying, deduplicating and capping accepted product URLs
//! - Stopping outstanding work once the cap is reached

use crate::classifier::{is_static_asset, ProductClassifier};
use crate::config::CrawlSettings;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::outcome::{CrawlOutcome, CrawlStats, CrawlWarning, WarningKind};
use crate::crawler::scheduler::FetchScheduler;
use crate::robots::RobotsResolver;
use crate::sitemap::{CandidateSource, SitemapWalker, WalkEvent};
use crate::state::{AcceptedSet, CrawlPhase, CrawlStatus, VisitedSet};
use crate::url::{normalize_url, QueryPolicy};
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Where the walk's roots came from
enum Roots {
    /// Sitemap directives (or the fallback for a robots.txt without any)
    Resolved(Vec<String>),
    /// robots.txt was unavailable; only the conventional location is tried
    Fallback(String),
}

/// Drives the crawl of a single site
///
/// A controller owns the per-crawl state (visited sitemaps, accepted products)
/// and is consumed by [`CrawlController::run`], so it cannot be reused.
/// Concurrent crawls of different sites use separate controllers and may
/// share one [`Fetcher`].
///
/// # Example
///
/// ```no_run
/// use product_scout::config::CrawlSettings;
/// use product_scout::{CrawlController, HttpFetcher, ProductClassifier};
/// use product_scout::config::{FetcherConfig, UserAgentConfig};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_agent = UserAgentConfig {
///     crawler_name: "ProductScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
/// let fetcher = Arc::new(HttpFetcher::from_config(&user_agent, &FetcherConfig::default())?);
/// let settings = CrawlSettings::new("shop.example.com", 100, 4, Duration::from_secs(10))?;
///
/// let outcome = CrawlController::new(settings, ProductClassifier::default(), fetcher)
///     .run()
///     .await;
/// println!("{} products ({})", outcome.products.len(), outcome.status);
/// # Ok(())
/// # }
/// ```
pub struct CrawlController {
    settings: CrawlSettings,
    classifier: ProductClassifier,
    fetcher: Arc<dyn Fetcher>,
    phase: CrawlPhase,
    shutdown: CancellationToken,
    warnings: Vec<CrawlWarning>,
    stats: CrawlStats,
    started_at: DateTime<Utc>,
}

impl CrawlController {
    /// Creates a controller in the `Init` phase
    pub fn new(
        settings: CrawlSettings,
        classifier: ProductClassifier,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            settings,
            classifier,
            fetcher,
            phase: CrawlPhase::Init,
            shutdown: CancellationToken::new(),
            warnings: Vec::new(),
            stats: CrawlStats::default(),
            started_at: Utc::now(),
        }
    }

    /// Stops the crawl early when `token` is cancelled
    ///
    /// The crawl then ends `Partial` with whatever was accepted so far.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// The current phase
    pub fn phase(&self) -> &CrawlPhase {
        &self.phase
    }

    /// Runs the crawl to completion
    ///
    /// Never fails: node-level failures are recorded as warnings and an
    /// unreachable site yields a `Partial` outcome.
    pub async fn run(mut self) -> CrawlOutcome {
        self.started_at = Utc::now();
        let domain = self.settings.domain.clone();
        tracing::info!("Starting crawl of {}", domain);

        self.transition(CrawlPhase::ResolvingRobots);
        let roots = match self.resolve_roots().await {
            Ok(roots) => roots,
            Err(reason) => {
                return self.finish(CrawlStatus::Partial { reason }, AcceptedSet::new(0));
            }
        };

        let (root_list, fallback_root) = match roots {
            Roots::Resolved(list) => (list, None),
            Roots::Fallback(root) => (vec![root.clone()], Some(root)),
        };

        if root_list.is_empty() {
            tracing::info!("No sitemap to walk for {}", domain);
        }

        self.transition(CrawlPhase::Walking);

        let scheduler = FetchScheduler::new(
            Arc::clone(&self.fetcher),
            self.settings.concurrency,
            self.settings.timeout,
        )
        .with_cancellation(self.shutdown.child_token());

        let mut walker = SitemapWalker::new(
            domain.clone(),
            &root_list,
            self.classifier.clone(),
            scheduler,
        )
        .with_page_inspection(self.settings.inspect_pages);

        let mut visited = VisitedSet::new();
        let mut accepted = AcceptedSet::new(self.settings.max_products);
        let mut fallback_parsed = false;

        while let Some(event) = walker.next(&mut visited).await {
            match event {
                WalkEvent::SitemapParsed { url, kind, entries } => {
                    self.stats.sitemaps_fetched += 1;
                    tracing::debug!("Sitemap {} ({}): {} entries", url, kind.as_str(), entries);
                    if fallback_root
                        .as_deref()
                        .is_some_and(|root| is_same_location(root, url.as_str()))
                    {
                        fallback_parsed = true;
                    }
                }
                WalkEvent::PageInspected { .. } => {
                    self.stats.pages_inspected += 1;
                }
                WalkEvent::Skipped(warning) => {
                    self.warnings.push(warning);
                }
                WalkEvent::Candidate { url, source } => {
                    self.stats.urls_seen += 1;

                    let is_product = match source {
                        CandidateSource::ProductMarkup => true,
                        CandidateSource::Sitemap | CandidateSource::PageLink => {
                            if is_static_asset(&url) {
                                self.stats.static_assets += 1;
                                continue;
                            }
                            self.classifier.classify(&url)
                        }
                    };

                    if !is_product {
                        continue;
                    }

                    if accepted.contains(&url) {
                        self.stats.duplicates += 1;
                        continue;
                    }

                    tracing::info!("Product found: {}", url);
                    accepted.insert(url);

                    if accepted.is_full() {
                        tracing::info!(
                            "Reached {} products for {}, stopping",
                            accepted.len(),
                            domain
                        );
                        walker.cancel();
                        break;
                    }
                }
            }
        }

        // Dropping the walker detaches in-flight fetches
        drop(walker);

        let status = if accepted.is_full() {
            CrawlStatus::Success
        } else if self.shutdown.is_cancelled() {
            CrawlStatus::Partial {
                reason: "crawl cancelled".to_string(),
            }
        } else if fallback_root.is_some() && !fallback_parsed {
            CrawlStatus::Partial {
                reason: "robots.txt unavailable and no sitemap at the default location"
                    .to_string(),
            }
        } else {
            CrawlStatus::Success
        };

        self.finish(status, accepted)
    }

    /// Runs the ResolvingRobots phase
    ///
    /// Returns the reason for a partial result when there is nothing to walk.
    async fn resolve_roots(&mut self) -> Result<Roots, String> {
        let resolver = RobotsResolver::new(
            Arc::clone(&self.fetcher),
            self.settings.timeout,
            self.settings.sitemap_fallback,
        );

        match resolver.resolve(&self.settings.domain).await {
            Ok(roots) => Ok(Roots::Resolved(roots)),
            Err(ScoutError::RobotsUnavailable { url, reason }) => {
                tracing::warn!("robots.txt unavailable at {}: {}", url, reason);
                self.warnings.push(CrawlWarning::new(
                    url,
                    WarningKind::RobotsUnavailable,
                    reason.as_str(),
                ));

                match resolver.fallback_sitemaps(&self.settings.domain).pop() {
                    Some(root) => {
                        tracing::info!("Trying default sitemap location {}", root);
                        Ok(Roots::Fallback(root))
                    }
                    None => Err(format!("robots.txt unavailable: {}", reason)),
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn transition(&mut self, next: CrawlPhase) {
        if !self.phase.can_transition_to(&next) {
            tracing::error!("Invalid phase transition {} -> {}", self.phase, next);
            return;
        }
        tracing::debug!(
            "{}: phase {} -> {}",
            self.settings.domain,
            self.phase,
            next
        );
        self.phase = next;
    }

    fn finish(mut self, status: CrawlStatus, accepted: AcceptedSet) -> CrawlOutcome {
        self.transition(CrawlPhase::Done(status.clone()));

        let finished_at = Utc::now();
        tracing::info!(
            "Crawl of {} finished ({}): {} products, {} warnings",
            self.settings.domain,
            status,
            accepted.len(),
            self.warnings.len()
        );

        CrawlOutcome {
            domain: self.settings.domain.to_string(),
            status,
            products: accepted.into_strings(),
            warnings: self.warnings,
            stats: self.stats,
            started_at: self.started_at,
            finished_at,
        }
    }
}

/// Compares two sitemap locations after normalization
fn is_same_location(a: &str, b: &str) -> bool {
    match (
        normalize_url(a, QueryPolicy::Keep),
        normalize_url(b, QueryPolicy::Keep),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::StaticFetcher;
    use std::time::Duration;

    const ROBOTS: &str = "https://x.test/robots.txt";
    const SITEMAP: &str = "https://x.test/sitemap.xml";

    fn urlset(locs: &[&str]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<url><loc>{}</loc></url>", loc))
            .collect();
        format!("<urlset>{}</urlset>", entries)
    }

    fn index(locs: &[&str]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
            .collect();
        format!("<sitemapindex>{}</sitemapindex>", entries)
    }

    fn settings(max_products: usize, concurrency: usize) -> CrawlSettings {
        CrawlSettings::new("https://x.test", max_products, concurrency, Duration::from_secs(1))
            .unwrap()
    }

    async fn crawl(fetcher: Arc<StaticFetcher>, settings: CrawlSettings) -> CrawlOutcome {
        CrawlController::new(settings, ProductClassifier::default(), fetcher)
            .run()
            .await
    }

    #[tokio::test]
    async fn test_cap_reached_in_first_urlset() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(
                    SITEMAP,
                    &urlset(&[
                        "https://x.test/a",
                        "https://x.test/product/123",
                        "https://x.test/b",
                        "https://x.test/p/456",
                        "https://x.test/p/789",
                    ]),
                ),
        );

        let outcome = crawl(fetcher, settings(2, 1)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(
            outcome.products,
            vec!["https://x.test/product/123", "https://x.test/p/456"]
        );
        assert_eq!(outcome.stats.urls_seen, 4);
    }

    #[tokio::test]
    async fn test_second_child_never_fetched_after_cap() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(
                    SITEMAP,
                    &index(&["https://x.test/s1.xml", "https://x.test/s2.xml"]),
                )
                .xml(
                    "https://x.test/s1.xml",
                    &urlset(&["https://x.test/p/1", "https://x.test/p/2"]),
                )
                .xml("https://x.test/s2.xml", &urlset(&["https://x.test/p/3"])),
        );

        let outcome = crawl(fetcher.clone(), settings(2, 1)).await;

        assert_eq!(outcome.products.len(), 2);
        assert_eq!(fetcher.request_count("https://x.test/s2.xml"), 0);
    }

    #[tokio::test]
    async fn test_lookahead_after_cap_does_not_change_result() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(
                    SITEMAP,
                    &index(&["https://x.test/s1.xml", "https://x.test/s2.xml"]),
                )
                .xml(
                    "https://x.test/s1.xml",
                    &urlset(&["https://x.test/p/1", "https://x.test/p/2"]),
                )
                .xml("https://x.test/s2.xml", &urlset(&["https://x.test/p/3"])),
        );

        let outcome = crawl(fetcher.clone(), settings(2, 2)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(
            outcome.products,
            vec!["https://x.test/p/1", "https://x.test/p/2"]
        );
        // The sibling may have been fetched ahead, but never twice
        assert!(fetcher.request_count("https://x.test/s2.xml") <= 1);
    }

    #[tokio::test]
    async fn test_robots_unavailable_fallback_unreachable() {
        let fetcher = Arc::new(StaticFetcher::new().status(ROBOTS, 404));

        let outcome = crawl(fetcher.clone(), settings(10, 1)).await;

        assert!(outcome.products.is_empty());
        assert!(matches!(outcome.status, CrawlStatus::Partial { .. }));
        assert_eq!(outcome.warnings[0].kind, WarningKind::RobotsUnavailable);
        assert_eq!(fetcher.request_count(SITEMAP), 1);
    }

    #[tokio::test]
    async fn test_robots_unavailable_fallback_succeeds() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .unreachable(ROBOTS)
                .xml(SITEMAP, &urlset(&["https://x.test/p/1"])),
        );

        let outcome = crawl(fetcher, settings(10, 1)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.products, vec!["https://x.test/p/1"]);
    }

    #[tokio::test]
    async fn test_robots_unavailable_without_fallback() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .status(ROBOTS, 500)
                .xml(SITEMAP, &urlset(&["https://x.test/p/1"])),
        );

        let outcome = crawl(fetcher.clone(), settings(10, 1).with_sitemap_fallback(false)).await;

        assert!(outcome.products.is_empty());
        assert_eq!(
            outcome.status.reason(),
            Some("robots.txt unavailable: HTTP 500")
        );
        assert_eq!(fetcher.request_count(SITEMAP), 0);
    }

    #[tokio::test]
    async fn test_robots_without_directives_uses_default_sitemap() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "User-agent: *\nDisallow: /cart")
                .xml(SITEMAP, &urlset(&["https://x.test/dp/B000123"])),
        );

        let outcome = crawl(fetcher, settings(10, 1)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.products, vec!["https://x.test/dp/B000123"]);
    }

    #[tokio::test]
    async fn test_duplicates_and_static_assets() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: /sitemap.xml\nSitemap: /other.xml")
                .xml(
                    SITEMAP,
                    &urlset(&[
                        "https://x.test/p/1",
                        "https://x.test/p/1/",
                        "https://x.test/p/banner.jpg",
                    ]),
                )
                .xml(
                    "https://x.test/other.xml",
                    &urlset(&["https://x.test/p/1#reviews", "https://x.test/item/2"]),
                ),
        );

        let outcome = crawl(fetcher, settings(10, 2)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(
            outcome.products,
            vec!["https://x.test/p/1", "https://x.test/item/2"]
        );
        assert_eq!(outcome.stats.duplicates, 2);
        assert_eq!(outcome.stats.static_assets, 1);
        assert_eq!(outcome.stats.sitemaps_fetched, 2);
    }

    #[tokio::test]
    async fn test_cycle_and_failures_do_not_abort() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(
                    SITEMAP,
                    &index(&[
                        "https://x.test/sitemap.xml",
                        "https://x.test/broken.xml",
                        "https://x.test/products.xml",
                    ]),
                )
                .xml("https://x.test/broken.xml", "<urlset><url>")
                .xml(
                    "https://x.test/products.xml",
                    &urlset(&["https://x.test/shoe-123456"]),
                ),
        );

        let outcome = crawl(fetcher.clone(), settings(10, 4)).await;

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.products, vec!["https://x.test/shoe-123456"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::Parse);
        assert_eq!(fetcher.request_count(SITEMAP), 1);
    }

    #[tokio::test]
    async fn test_order_deterministic_across_concurrency() {
        let build = || {
            Arc::new(
                StaticFetcher::new()
                    .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                    .xml(
                        SITEMAP,
                        &index(&[
                            "https://x.test/s1.xml",
                            "https://x.test/s2.xml",
                            "https://x.test/s3.xml",
                        ]),
                    )
                    .xml(
                        "https://x.test/s1.xml",
                        &urlset(&["https://x.test/p/1", "https://x.test/p/2"]),
                    )
                    .delay("https://x.test/s1.xml", Duration::from_millis(40))
                    .xml("https://x.test/s2.xml", &urlset(&["https://x.test/p/3"]))
                    .delay("https://x.test/s2.xml", Duration::from_millis(20))
                    .xml("https://x.test/s3.xml", &urlset(&["https://x.test/p/4"])),
            )
        };

        let baseline = crawl(build(), settings(100, 1)).await.products;
        assert_eq!(
            baseline,
            vec![
                "https://x.test/p/1",
                "https://x.test/p/2",
                "https://x.test/p/3",
                "https://x.test/p/4"
            ]
        );

        for concurrency in [2, 3, 8] {
            let products = crawl(build(), settings(100, concurrency)).await.products;
            assert_eq!(products, baseline, "concurrency {}", concurrency);
        }
    }

    #[tokio::test]
    async fn test_page_inspection_accepts_markup_and_links() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(
                    SITEMAP,
                    &urlset(&["https://x.test/blue-mug", "https://x.test/collections/mugs"]),
                )
                .html(
                    "https://x.test/blue-mug",
                    r#"<script type="application/ld+json">{"@type":"Product"}</script>"#,
                )
                .html(
                    "https://x.test/collections/mugs",
                    r#"<a href="/p/1">one</a><a href="/about">about</a><a href="/p/2">two</a>"#,
                ),
        );

        let outcome = crawl(fetcher, settings(10, 2).with_page_inspection(true)).await;

        assert_eq!(
            outcome.products,
            vec![
                "https://x.test/blue-mug",
                "https://x.test/p/1",
                "https://x.test/p/2"
            ]
        );
        assert_eq!(outcome.stats.pages_inspected, 2);
    }

    #[tokio::test]
    async fn test_shutdown_token_ends_partial() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .text(ROBOTS, "Sitemap: https://x.test/sitemap.xml")
                .xml(SITEMAP, &urlset(&["https://x.test/p/1"])),
        );
        let token = CancellationToken::new();
        token.cancel();

        let outcome = CrawlController::new(settings(10, 1), ProductClassifier::default(), fetcher)
            .with_shutdown(token)
            .run()
            .await;

        assert!(outcome.products.is_empty());
        assert_eq!(outcome.status.reason(), Some("crawl cancelled"));
    }

    #[test]
    fn test_new_controller_is_init() {
        let controller = CrawlController::new(
            settings(1, 1),
            ProductClassifier::default(),
            Arc::new(StaticFetcher::new()),
        );
        assert_eq!(controller.phase(), &CrawlPhase::Init);
    }
}

//! Robots.txt handling module
//!
//! This module fetches a site's robots.txt and turns its `Sitemap:` directives
//! into the ordered list of sitemap roots the crawl starts from.

mod parser;

pub use parser::parse_sitemap_directives;

use crate::crawler::{fetch_with_deadline, Fetcher};
use crate::url::Domain;
use crate::ScoutError;
use std::sync::Arc;
use std::time::Duration;

/// Resolves the sitemap roots of a domain
///
/// # Fallback Policy
///
/// When robots.txt is reachable but names no sitemap, the conventional
/// `{domain}/sitemap.xml` is returned as the single candidate if
/// `sitemap_fallback` is enabled. Whether that location exists is only known
/// once it is fetched.
pub struct RobotsResolver {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    sitemap_fallback: bool,
}

impl RobotsResolver {
    /// Creates a new resolver
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration, sitemap_fallback: bool) -> Self {
        Self {
            fetcher,
            timeout,
            sitemap_fallback,
        }
    }

    /// Fetches `{domain}/robots.txt` and returns its sitemap locations
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Sitemap locations in order of appearance (possibly
    ///   the fallback candidate, possibly empty)
    /// * `Err(ScoutError::RobotsUnavailable)` - Transport failure or non-2xx status
    pub async fn resolve(&self, domain: &Domain) -> Result<Vec<String>, ScoutError> {
        let robots_url = domain.robots_url();
        tracing::debug!("Fetching robots.txt: {}", robots_url);

        let response = fetch_with_deadline(self.fetcher.as_ref(), &robots_url, self.timeout)
            .await
            .map_err(|e| ScoutError::RobotsUnavailable {
                url: robots_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(ScoutError::RobotsUnavailable {
                url: robots_url,
                reason: format!("HTTP {}", response.status),
            });
        }

        let content = String::from_utf8_lossy(&response.body);
        let sitemaps = parse_sitemap_directives(&content, domain);

        if sitemaps.is_empty() {
            tracing::info!("robots.txt for {} names no sitemap", domain);
            return Ok(self.fallback_sitemaps(domain));
        }

        tracing::info!(
            "Found {} sitemap(s) in robots.txt for {}",
            sitemaps.len(),
            domain
        );
        Ok(sitemaps)
    }

    /// The fallback candidates for `domain` under the current policy
    pub fn fallback_sitemaps(&self, domain: &Domain) -> Vec<String> {
        if self.sitemap_fallback {
            vec![domain.default_sitemap_url()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchResponse;
    use crate::TransportError;
    use async_trait::async_trait;

    /// Answers every request with the same canned result
    struct CannedFetcher(Result<FetchResponse, TransportError>);

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<FetchResponse, TransportError> {
            self.0.clone()
        }
    }

    fn ok(status: u16, body: &str) -> CannedFetcher {
        CannedFetcher(Ok(FetchResponse {
            final_url: "https://x.test/robots.txt".to_string(),
            status,
            content_type: Some("text/plain".to_string()),
            body: body.as_bytes().to_vec(),
        }))
    }

    fn resolver(fetcher: CannedFetcher, fallback: bool) -> RobotsResolver {
        RobotsResolver::new(Arc::new(fetcher), Duration::from_secs(1), fallback)
    }

    fn domain() -> Domain {
        Domain::parse("https://x.test").unwrap()
    }

    #[tokio::test]
    async fn test_resolve_directives() {
        let resolver = resolver(ok(200, "Sitemap: https://x.test/sitemap.xml"), true);
        let sitemaps = resolver.resolve(&domain()).await.unwrap();
        assert_eq!(sitemaps, vec!["https://x.test/sitemap.xml"]);
    }

    #[tokio::test]
    async fn test_no_directive_uses_fallback() {
        let resolver = resolver(ok(200, "User-agent: *\nDisallow:"), true);
        let sitemaps = resolver.resolve(&domain()).await.unwrap();
        assert_eq!(sitemaps, vec!["https://x.test/sitemap.xml"]);
    }

    #[tokio::test]
    async fn test_no_directive_without_fallback() {
        let resolver = resolver(ok(200, "User-agent: *\nDisallow:"), false);
        assert!(resolver.resolve(&domain()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_unavailable() {
        let resolver = resolver(ok(404, "not found"), true);
        let result = resolver.resolve(&domain()).await;
        assert!(matches!(result, Err(ScoutError::RobotsUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let fetcher = CannedFetcher(Err(TransportError::Connect {
            url: "https://x.test/robots.txt".to_string(),
            message: "connection refused".to_string(),
        }));
        let result = resolver(fetcher, true).resolve(&domain()).await;
        match result {
            Err(ScoutError::RobotsUnavailable { url, reason }) => {
                assert_eq!(url, "https://x.test/robots.txt");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected RobotsUnavailable, got {:?}", other),
        }
    }
}

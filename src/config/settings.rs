use crate::config::types::{Config, SiteEntry};
use crate::url::Domain;
use crate::ConfigError;
use std::time::Duration;

/// Upper bound for per-site concurrency
pub const MAX_CONCURRENCY: usize = 64;

/// Smallest accepted request timeout
pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Everything the crawl engine needs for one site
///
/// Built with [`CrawlSettings::new`] (or [`Config::crawl_settings`]) so an
/// invalid combination is rejected before any request is made.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub domain: Domain,
    pub max_products: usize,
    /// Fetches in flight at once for this site
    ///
    /// Above 1 the walker fetches ahead of the node it is processing, so a
    /// sibling sitemap after the one that fills the cap may still be
    /// requested; its result is discarded. With 1 nothing past the current
    /// node is ever fetched.
    pub concurrency: usize,
    pub timeout: Duration,
    /// Probe the conventional `/sitemap.xml` when robots.txt names no sitemap
    pub sitemap_fallback: bool,
    /// Fetch unclassified leaf pages and look for product markup
    pub inspect_pages: bool,
}

impl CrawlSettings {
    /// Creates validated settings with the fallback probe on and page inspection off
    ///
    /// # Example
    ///
    /// ```
    /// use product_scout::config::CrawlSettings;
    /// use std::time::Duration;
    ///
    /// let settings = CrawlSettings::new("shop.example.com", 50, 4, Duration::from_secs(10)).unwrap();
    /// assert_eq!(settings.domain.to_string(), "https://shop.example.com");
    ///
    /// assert!(CrawlSettings::new("shop.example.com", 0, 4, Duration::from_secs(10)).is_err());
    /// ```
    pub fn new(
        domain: &str,
        max_products: usize,
        concurrency: usize,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let domain = Domain::parse(domain)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid domain '{}': {}", domain, e)))?;

        let settings = Self {
            domain,
            max_products,
            concurrency,
            timeout,
            sitemap_fallback: true,
            inspect_pages: false,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Sets the fallback probe policy
    pub fn with_sitemap_fallback(mut self, enabled: bool) -> Self {
        self.sitemap_fallback = enabled;
        self
    }

    /// Sets the page inspection policy
    pub fn with_page_inspection(mut self, enabled: bool) -> Self {
        self.inspect_pages = enabled;
        self
    }

    /// Checks the numeric bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_products < 1 {
            return Err(ConfigError::Validation(format!(
                "max_products must be >= 1, got {}",
                self.max_products
            )));
        }

        if self.concurrency < 1 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, self.concurrency
            )));
        }

        if self.timeout < MIN_TIMEOUT {
            return Err(ConfigError::Validation(format!(
                "timeout must be >= {}ms, got {}ms",
                MIN_TIMEOUT.as_millis(),
                self.timeout.as_millis()
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Builds crawl settings for one configured site
    pub fn crawl_settings(&self, site: &SiteEntry) -> Result<CrawlSettings, ConfigError> {
        Ok(CrawlSettings::new(
            &site.domain,
            self.crawler.max_products,
            self.crawler.concurrency,
            Duration::from_millis(self.crawler.timeout_ms),
        )?
        .with_sitemap_fallback(self.crawler.sitemap_fallback)
        .with_page_inspection(self.crawler.inspect_pages))
    }
}

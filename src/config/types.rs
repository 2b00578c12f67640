use serde::Deserialize;

use crate::classifier::{DEFAULT_NUMERIC_ID_MIN_DIGITS, DEFAULT_PATH_TOKENS};

/// Main configuration structure for Product-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Stop a site's crawl once this many product URLs were found
    #[serde(rename = "max-products")]
    pub max_products: usize,

    /// Maximum number of fetches in flight for one site; 1 disables fetching ahead
    pub concurrency: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Probe `/sitemap.xml` when robots.txt names no sitemap
    #[serde(rename = "sitemap-fallback", default = "default_true")]
    pub sitemap_fallback: bool,

    /// Fetch leaf pages that fail URL classification and look for product markup
    #[serde(rename = "inspect-pages", default)]
    pub inspect_pages: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// HTTP retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Extra attempts after a timeout, connection failure or 5xx response
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Product URL rules
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Path substrings that mark a product page
    #[serde(rename = "path-tokens", default = "default_path_tokens")]
    pub path_tokens: Vec<String>,

    /// Minimum digits for the numeric-ID suffix rule; 0 disables it
    #[serde(
        rename = "numeric-id-min-digits",
        default = "default_numeric_id_min_digits"
    )]
    pub numeric_id_min_digits: usize,

    /// Query parameters that mark a product page
    #[serde(rename = "query-params", default)]
    pub query_params: Vec<String>,

    /// Custom regexes matched against `path` or `path?query`
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            path_tokens: default_path_tokens(),
            numeric_id_min_digits: default_numeric_id_min_digits(),
            query_params: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives one `<host>/product_links.txt` per site
    pub directory: String,
}

/// A site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Base domain, e.g. "https://shop.example.com" or "shop.example.com"
    pub domain: String,
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_path_tokens() -> Vec<String> {
    DEFAULT_PATH_TOKENS.iter().map(|t| t.to_string()).collect()
}

fn default_numeric_id_min_digits() -> usize {
    DEFAULT_NUMERIC_ID_MIN_DIGITS
}

//! Product-Scout: a sitemap-driven product URL finder
//!
//! This crate discovers product-detail page URLs on a website by reading its
//! robots.txt, walking its sitemap tree depth-first, and classifying every
//! discovered URL against a set of product-URL heuristics. The crawl stops as
//! soon as the configured number of products has been found.

pub mod classifier;
pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Product-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("robots.txt unavailable at {url}: {reason}")]
    RobotsUnavailable { url: String, reason: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are the only errors that prevent a crawl from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid product pattern: {0}")]
    InvalidPattern(String),
}

/// Network-level failures reported by a [`crawler::Fetcher`]
///
/// A transport error never aborts a crawl; the affected node is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl TransportError {
    /// The URL the failed request was addressed to
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Request { url, .. }
            | Self::Body { url, .. } => url,
        }
    }

    /// Returns true if a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connect { .. })
    }
}

/// Content failures for robots.txt and sitemap documents
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed XML in {url}: {message}")]
    Xml { url: String, message: String },

    #[error("Failed to decompress {url}: {message}")]
    Gzip { url: String, message: String },

    #[error("Invalid text encoding in {url}")]
    Encoding { url: String },

    #[error("Sitemap {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Product-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use classifier::ProductClassifier;
pub use config::{Config, CrawlSettings};
pub use crawler::{CrawlController, CrawlOutcome, Fetcher, HttpFetcher};
pub use state::{CrawlPhase, CrawlStatus};
pub use url::{normalize_url, CandidateUrl, Domain, QueryPolicy};

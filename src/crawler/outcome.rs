//! Crawl results
//!
//! A [`CrawlOutcome`] is everything a finished crawl hands back: the ordered
//! product URLs, how the crawl ended, and the node-level failures it stepped
//! over along the way.

use crate::state::CrawlStatus;
use crate::{ParseError, TransportError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Category of a non-fatal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// robots.txt could not be fetched
    RobotsUnavailable,
    /// Network-level failure or timeout
    Transport,
    /// The server answered with a non-2xx status
    HttpStatus,
    /// Gzip, encoding or XML failure
    Parse,
    /// A location that could not be turned into a URL
    InvalidUrl,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RobotsUnavailable => "robots_unavailable",
            Self::Transport => "transport",
            Self::HttpStatus => "http_status",
            Self::Parse => "parse",
            Self::InvalidUrl => "invalid_url",
        };
        f.write_str(name)
    }
}

/// A node skipped because of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlWarning {
    pub url: String,
    pub kind: WarningKind,
    pub message: String,
}

impl CrawlWarning {
    pub fn new(url: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::new(url, WarningKind::HttpStatus, format!("HTTP {}", status))
    }
}

impl From<TransportError> for CrawlWarning {
    fn from(e: TransportError) -> Self {
        Self::new(e.url().to_string(), WarningKind::Transport, e.to_string())
    }
}

impl From<ParseError> for CrawlWarning {
    fn from(e: ParseError) -> Self {
        let url = match &e {
            ParseError::Xml { url, .. }
            | ParseError::Gzip { url, .. }
            | ParseError::Encoding { url }
            | ParseError::TooLarge { url, .. } => url.clone(),
        };
        Self::new(url, WarningKind::Parse, e.to_string())
    }
}

impl fmt::Display for CrawlWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.url, self.message)
    }
}

/// Counters collected while a crawl runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Sitemap documents fetched and parsed
    pub sitemaps_fetched: usize,
    /// Leaf pages fetched for inspection
    pub pages_inspected: usize,
    /// Candidate URLs handed to the classifier
    pub urls_seen: usize,
    /// Candidates skipped as static assets
    pub static_assets: usize,
    /// Product URLs seen again after acceptance
    pub duplicates: usize,
}

/// Everything a finished crawl produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// The crawled origin, e.g. `https://shop.example.com`
    pub domain: String,
    pub status: CrawlStatus,
    /// Accepted product URLs in discovery order
    pub products: Vec<String>,
    pub warnings: Vec<CrawlWarning>,
    pub stats: CrawlStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlOutcome {
    /// Wall-clock duration of the crawl
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

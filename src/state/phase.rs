//! Crawl phase definitions for tracking controller progress
//!
//! A crawl moves strictly forward through its phases and ends in exactly one
//! `Done` status.

use serde::Serialize;
use std::fmt;

/// How a finished crawl ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrawlStatus {
    /// All reachable sitemaps were walked, or the product cap was reached
    Success,

    /// The crawl could not discover any sitemap to walk
    Partial { reason: String },
}

impl CrawlStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The reason for a partial result, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Partial { reason } => Some(reason),
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial { reason } => write!(f, "partial ({})", reason),
        }
    }
}

/// Represents the current phase of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Controller created, nothing fetched yet
    Init,

    /// Fetching and parsing robots.txt
    ResolvingRobots,

    /// Walking the sitemap tree
    Walking,

    /// Terminal
    Done(CrawlStatus),
}

impl CrawlPhase {
    /// Returns true once the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Returns true if moving to `next` is a legal transition
    ///
    /// Phases only move forward; `Done` may be entered from any active phase.
    pub fn can_transition_to(&self, next: &CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::ResolvingRobots)
                | (Self::ResolvingRobots, Self::Walking)
                | (Self::Init | Self::ResolvingRobots | Self::Walking, Self::Done(_))
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ResolvingRobots => "resolving_robots",
            Self::Walking => "walking",
            Self::Done(CrawlStatus::Success) => "done_success",
            Self::Done(CrawlStatus::Partial { .. }) => "done_partial",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

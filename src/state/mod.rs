//! State module for tracking crawl progress
//!
//! This module provides the state a single crawl owns while it runs.
//!
//! # Components
//!
//! - `CrawlPhase`: Where the controller is in its lifecycle
//! - `CrawlStatus`: How a finished crawl ended
//! - `VisitedSet`: Sitemap locations already taken for fetching (cycle guard)
//! - `AcceptedSet`: Ordered, capped set of accepted product URLs

mod phase;
mod sets;

// Re-export main types
pub use phase::{CrawlPhase, CrawlStatus};
pub use sets::{AcceptedSet, VisitedSet};

//! Sitemap handling module
//!
//! This module provides:
//! - Parsing of sitemap indexes and URL sets, plain or gzipped
//! - The depth-first [`SitemapWalker`] that turns a sitemap tree into a lazy
//!   sequence of candidate URLs

mod parser;
mod walker;

pub use parser::{is_sitemap_location, parse_sitemap, SitemapKind, SitemapNode, MAX_SITEMAP_BYTES};
pub use walker::{CandidateSource, SitemapWalker, WalkEvent};

//! Output module for persisting and reporting crawl results
//!
//! This module handles:
//! - Writing each site's product URLs to a text file
//! - Printing a human-readable summary of a crawl

mod summary;
mod text_file;
mod traits;

pub use summary::{format_summary, print_summary};
pub use text_file::{TextFileSink, PRODUCT_LINKS_FILE};
pub use traits::{OutputError, OutputResult, ResultSink};

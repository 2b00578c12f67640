//! Output sink traits and errors
//!
//! This module defines the trait interface for persisting the result of a
//! crawl.

use crate::crawler::CrawlOutcome;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persists the accepted product URLs of a finished crawl
///
/// Implementations must be thread-safe; one sink serves every site of a run.
pub trait ResultSink: Send + Sync {
    /// Writes the outcome's product URLs
    ///
    /// An outcome without products writes nothing.
    fn persist(&self, outcome: &CrawlOutcome) -> OutputResult<()>;
}

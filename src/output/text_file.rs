//! Plain-text product list output
//!
//! Writes `{directory}/{host}/product_links.txt`, one URL per line in
//! discovery order.

use crate::crawler::CrawlOutcome;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use crate::url::Domain;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name written inside each site's folder
pub const PRODUCT_LINKS_FILE: &str = "product_links.txt";

/// [`ResultSink`] writing one newline-delimited text file per site
///
/// A previous file for the same site is replaced.
#[derive(Debug, Clone)]
pub struct TextFileSink {
    directory: PathBuf,
}

impl TextFileSink {
    /// Creates a sink rooted at `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where the product list for `domain` is written
    pub fn path_for(&self, domain: &Domain) -> PathBuf {
        self.directory
            .join(domain.folder_name())
            .join(PRODUCT_LINKS_FILE)
    }
}

impl ResultSink for TextFileSink {
    fn persist(&self, outcome: &CrawlOutcome) -> OutputResult<()> {
        if outcome.products.is_empty() {
            tracing::debug!("No products for {}, nothing written", outcome.domain);
            return Ok(());
        }

        let domain = Domain::parse(&outcome.domain)
            .map_err(|e| OutputError::Write(format!("{}: {}", outcome.domain, e)))?;
        let path = self.path_for(&domain);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        for url in &outcome.products {
            writeln!(writer, "{}", url)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} product URLs to {}",
            outcome.products.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlStats;
    use crate::state::CrawlStatus;
    use chrono::Utc;
    use tempfile::TempDir;

    fn outcome(domain: &str, products: &[&str]) -> CrawlOutcome {
        let now = Utc::now();
        CrawlOutcome {
            domain: domain.to_string(),
            status: CrawlStatus::Success,
            products: products.iter().map(|p| p.to_string()).collect(),
            warnings: Vec::new(),
            stats: CrawlStats::default(),
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_writes_products_in_order() {
        let dir = TempDir::new().unwrap();
        let sink = TextFileSink::new(dir.path());

        sink.persist(&outcome(
            "https://shop.x.test",
            &["https://shop.x.test/p/2", "https://shop.x.test/p/1"],
        ))
        .unwrap();

        let content =
            fs::read_to_string(dir.path().join("shop.x.test").join(PRODUCT_LINKS_FILE)).unwrap();
        assert_eq!(content, "https://shop.x.test/p/2\nhttps://shop.x.test/p/1\n");
    }

    #[test]
    fn test_previous_file_replaced() {
        let dir = TempDir::new().unwrap();
        let sink = TextFileSink::new(dir.path());

        sink.persist(&outcome("https://x.test", &["https://x.test/p/1", "https://x.test/p/2"]))
            .unwrap();
        sink.persist(&outcome("https://x.test", &["https://x.test/p/3"]))
            .unwrap();

        let path = sink.path_for(&Domain::parse("x.test").unwrap());
        assert_eq!(fs::read_to_string(path).unwrap(), "https://x.test/p/3\n");
    }

    #[test]
    fn test_empty_outcome_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let sink = TextFileSink::new(dir.path());

        sink.persist(&outcome("https://x.test", &[])).unwrap();

        assert!(!dir.path().join("x.test").exists());
    }

    #[test]
    fn test_port_in_folder_name() {
        let dir = TempDir::new().unwrap();
        let sink = TextFileSink::new(dir.path());
        let domain = Domain::parse("http://127.0.0.1:8080").unwrap();

        assert_eq!(
            sink.path_for(&domain),
            dir.path().join("127.0.0.1_8080").join(PRODUCT_LINKS_FILE)
        );
    }
}

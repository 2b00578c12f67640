//! Human-readable crawl summaries

use crate::crawler::{CrawlOutcome, WarningKind};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Warnings listed individually before the summary truncates
const MAX_LISTED_WARNINGS: usize = 10;

/// Formats a crawl outcome for the terminal
pub fn format_summary(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();
    let elapsed = outcome.elapsed();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== {} ===", outcome.domain);
    let _ = writeln!(out, "  Status: {}", outcome.status);
    let _ = writeln!(
        out,
        "  Duration: {:.2}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    let _ = writeln!(out, "  Products found: {}", outcome.products.len());
    let _ = writeln!(out, "  Sitemaps fetched: {}", outcome.stats.sitemaps_fetched);
    if outcome.stats.pages_inspected > 0 {
        let _ = writeln!(out, "  Pages inspected: {}", outcome.stats.pages_inspected);
    }
    let _ = writeln!(out, "  URLs examined: {}", outcome.stats.urls_seen);
    let _ = writeln!(
        out,
        "  Skipped: {} static assets, {} duplicates",
        outcome.stats.static_assets, outcome.stats.duplicates
    );

    if !outcome.warnings.is_empty() {
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for warning in &outcome.warnings {
            *by_kind.entry(kind_label(warning.kind)).or_default() += 1;
        }

        let _ = writeln!(out, "  Warnings ({}):", outcome.warnings.len());
        for (kind, count) in &by_kind {
            let _ = writeln!(out, "    {}: {}", kind, count);
        }
        for warning in outcome.warnings.iter().take(MAX_LISTED_WARNINGS) {
            let _ = writeln!(out, "    - {}: {}", warning.url, warning.message);
        }
        if outcome.warnings.len() > MAX_LISTED_WARNINGS {
            let _ = writeln!(
                out,
                "    ... and {} more",
                outcome.warnings.len() - MAX_LISTED_WARNINGS
            );
        }
    }

    out
}

/// Prints a crawl outcome to stdout
pub fn print_summary(outcome: &CrawlOutcome) {
    println!("{}", format_summary(outcome));
}

fn kind_label(kind: WarningKind) -> String {
    match kind {
        WarningKind::RobotsUnavailable => "robots.txt unavailable".to_string(),
        WarningKind::Transport => "network errors".to_string(),
        WarningKind::HttpStatus => "HTTP errors".to_string(),
        WarningKind::Parse => "unparseable sitemaps".to_string(),
        WarningKind::InvalidUrl => "invalid URLs".to_string(),
    }
}

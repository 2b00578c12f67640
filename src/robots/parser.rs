//! robots.txt directive parsing
//!
//! Only `Sitemap:` directives matter to the crawl; every other line is ignored.

use crate::url::Domain;

/// Extracts sitemap locations from robots.txt content
///
/// A line of the form `Sitemap: <url>` (key matched case-insensitively, value
/// whitespace-trimmed, trailing ` # comment` removed) contributes one location.
/// Relative values are resolved against `domain`. Malformed lines are skipped.
/// Locations are returned in order of appearance, first occurrence wins.
///
/// # Example
///
/// ```
/// use product_scout::robots::parse_sitemap_directives;
/// use product_scout::url::Domain;
///
/// let domain = Domain::parse("https://x.test").unwrap();
/// let content = "User-agent: *\nDisallow: /cart\nsitemap:  https://x.test/sitemap.xml \nSitemap: /extra.xml";
/// assert_eq!(
///     parse_sitemap_directives(content, &domain),
///     vec!["https://x.test/sitemap.xml", "https://x.test/extra.xml"]
/// );
/// ```
pub fn parse_sitemap_directives(content: &str, domain: &Domain) -> Vec<String> {
    let mut sitemaps: Vec<String> = Vec::new();

    for line in content.trim_start_matches('\u{feff}').lines() {
        let trimmed = line.trim();

        // Skip comments and empty lines
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };

        if !key.trim().eq_ignore_ascii_case("sitemap") {
            continue;
        }

        let value = strip_inline_comment(value).trim();
        if value.is_empty() {
            tracing::debug!("Skipping empty Sitemap directive");
            continue;
        }

        let resolved = match domain.resolve(value) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url.to_string(),
            Ok(url) => {
                tracing::debug!("Skipping non-HTTP sitemap location {}", url);
                continue;
            }
            Err(e) => {
                tracing::debug!("Skipping malformed Sitemap directive '{}': {}", value, e);
                continue;
            }
        };

        if !sitemaps.contains(&resolved) {
            sitemaps.push(resolved);
        }
    }

    sitemaps
}

/// Removes a ` # comment` suffix; a `#` glued to the URL is kept
fn strip_inline_comment(value: &str) -> &str {
    match value.find(" #").or_else(|| value.find("\t#")) {
        Some(index) => &value[..index],
        None => value,
    }
}

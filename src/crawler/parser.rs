//! HTML inspection of leaf pages
//!
//! This module handles parsing a fetched page to find out:
//! - Whether the page declares itself a product (JSON-LD `@type: Product`)
//! - Which links it carries (from `<a>` tags), in document order
//!
//! Parsing is synchronous; callers run it after their fetch has completed.

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// What a page inspection found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFindings {
    /// The page carries structured data describing a product
    pub product_markup: bool,

    /// Absolute HTTP(S) links in document order, duplicates removed
    pub links: Vec<Url>,
}

/// Inspects an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - The page's final URL, for resolving relative links
///
/// # Example
///
/// ```
/// use product_scout::crawler::inspect_page;
/// use url::Url;
///
/// let html = r#"<html><head>
///   <script type="application/ld+json">{"@type": "Product", "name": "Mug"}</script>
/// </head><body><a href="/p/2">Other mug</a></body></html>"#;
/// let base_url = Url::parse("https://x.test/mug").unwrap();
/// let findings = inspect_page(html, &base_url);
/// assert!(findings.product_markup);
/// assert_eq!(findings.links[0].as_str(), "https://x.test/p/2");
/// ```
pub fn inspect_page(html: &str, base_url: &Url) -> PageFindings {
    let document = Html::parse_document(html);

    PageFindings {
        product_markup: has_product_markup(&document),
        links: extract_links(&document, base_url),
    }
}

/// Returns true if any JSON-LD block describes a `Product`
fn has_product_markup(document: &Html) -> bool {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return false;
    };

    document.select(&selector).any(|element| {
        let raw = element.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => describes_product(&value),
            // Malformed blocks are common; fall back to a textual check
            Err(_) => {
                let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                compact.to_ascii_lowercase().contains(r#""@type":"product""#)
            }
        }
    })
}

/// Walks a JSON-LD value looking for `"@type": "Product"`
///
/// Handles top-level arrays, `@graph` containers and `@type` arrays.
fn describes_product(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(describes_product),
        Value::Object(map) => {
            let typed = match map.get("@type") {
                Some(Value::String(t)) => is_product_type(t),
                Some(Value::Array(types)) => types
                    .iter()
                    .filter_map(Value::as_str)
                    .any(is_product_type),
                _ => false,
            };
            typed || map.get("@graph").is_some_and(describes_product)
        }
        _ => false,
    }
}

fn is_product_type(t: &str) -> bool {
    let t = t.rsplit('/').next().unwrap_or(t);
    t.eq_ignore_ascii_case("product") || t.eq_ignore_ascii_case("productgroup")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links: Vec<Url> = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                if !links.contains(&absolute_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://x.test/collections/mugs").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        inspect_page(html, &base_url())
            .links
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_product_markup_detected() {
        let html = r#"<script type="application/ld+json">
            {"@context": "https://schema.org", "@type": "Product", "name": "Mug"}
        </script>"#;
        assert!(inspect_page(html, &base_url()).product_markup);
    }

    #[test]
    fn test_product_in_graph() {
        let html = r#"<script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "BreadcrumbList"},
                {"@type": ["Thing", "Product"], "name": "Mug"}
            ]}
        </script>"#;
        assert!(inspect_page(html, &base_url()).product_markup);
    }

    #[test]
    fn test_malformed_json_ld_falls_back_to_text() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Product", "name": "Mug",}
        </script>"#;
        assert!(inspect_page(html, &base_url()).product_markup);
    }

    #[test]
    fn test_other_types_not_product() {
        let html = r#"<script type="application/ld+json">{"@type": "CollectionPage"}</script>
            <script type="text/javascript">var x = {"@type": "Product"};</script>"#;
        assert!(!inspect_page(html, &base_url()).product_markup);
    }

    #[test]
    fn test_links_in_document_order() {
        let html = r#"<html><body>
            <a href="/p/2">Two</a>
            <a href="https://x.test/p/1">One</a>
            <a href="mug-3">Three</a>
            <a href="/p/2">Two again</a>
        </body></html>"#;
        assert_eq!(
            links(html),
            vec![
                "https://x.test/p/2",
                "https://x.test/p/1",
                "https://x.test/collections/mug-3"
            ]
        );
    }

    #[test]
    fn test_excluded_links() {
        let html = r##"<html><body>
            <a href="javascript:void(0)">js</a>
            <a href="MAILTO:shop@x.test">mail</a>
            <a href="tel:+1234567890">call</a>
            <a href="data:text/html,<h1>x</h1>">data</a>
            <a href="#reviews">jump</a>
            <a href="/manual.pdf" download>manual</a>
            <a href="ftp://x.test/file">ftp</a>
            <a href="">empty</a>
        </body></html>"##;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(inspect_page("", &base_url()), PageFindings::default());
    }
}

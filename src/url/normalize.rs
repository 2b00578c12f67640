use crate::url::{CandidateUrl, QueryPolicy};
use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a URL string into a [`CandidateUrl`]
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase the scheme and host (default ports are dropped by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Query, depending on `query`:
///    - [`QueryPolicy::Strip`]: drop it entirely
///    - [`QueryPolicy::Keep`]: remove tracking parameters, sort the rest,
///      drop an empty query string
///
/// Normalizing an already normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use product_scout::url::{normalize_url, QueryPolicy};
///
/// let url = normalize_url("HTTPS://Shop.Example.COM/product/42/?color=red#reviews", QueryPolicy::Strip).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/product/42");
/// ```
pub fn normalize_url(url_str: &str, query: QueryPolicy) -> Result<CandidateUrl, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url, query)
}

/// Normalizes an already parsed URL
///
/// See [`normalize_url`] for the rules applied.
pub fn normalize_parsed(mut url: Url, query: QueryPolicy) -> Result<CandidateUrl, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingDomain)?;
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    match query {
        QueryPolicy::Strip => url.set_query(None),
        QueryPolicy::Keep => {
            if url.query().is_some() {
                let params = filter_and_sort_query_params(&url);
                if params.is_empty() {
                    url.set_query(None);
                } else {
                    url.query_pairs_mut()
                        .clear()
                        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                }
            }
        }
    }

    Ok(CandidateUrl::from_normalized(url))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

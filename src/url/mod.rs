//! URL handling module for Product-Scout
//!
//! This module provides URL normalization, the crawl [`Domain`] and the
//! [`CandidateUrl`] newtype that every dedup set is keyed by.

mod domain;
mod normalize;

use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, Domain};
pub use normalize::{normalize_parsed, normalize_url};

/// What normalization does with the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryPolicy {
    /// Drop the query entirely
    #[default]
    Strip,
    /// Keep the query minus tracking parameters, with parameters sorted
    Keep,
}

/// A normalized absolute HTTP(S) URL
///
/// Values can only be produced by [`normalize_url`] / [`normalize_parsed`], so
/// two equal `CandidateUrl`s always denote the same normalized location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateUrl(Url);

impl CandidateUrl {
    pub(crate) fn from_normalized(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The path component, always starting with `/`
    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CandidateUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_equality_after_normalization() {
        let a = normalize_url("https://EXAMPLE.com/p/1/", QueryPolicy::Strip).unwrap();
        let b = normalize_url("https://example.com//p/1#top", QueryPolicy::Strip).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_candidate_accessors() {
        let url = normalize_url("https://example.com/item/9?pid=3", QueryPolicy::Keep).unwrap();
        assert_eq!(url.path(), "/item/9");
        assert_eq!(url.query(), Some("pid=3"));
        assert_eq!(url.as_url().host_str(), Some("example.com"));
        assert_eq!(url.clone().into_string(), "https://example.com/item/9?pid=3");
        assert_eq!(format!("{}", url), "https://example.com/item/9?pid=3");
    }

    #[test]
    fn test_default_query_policy_strips() {
        assert_eq!(QueryPolicy::default(), QueryPolicy::Strip);
    }
}

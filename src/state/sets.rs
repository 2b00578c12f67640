//! Per-crawl dedup sets
//!
//! Both sets are owned by a single crawl and mutated only by its controller
//! task, so they carry no synchronization.

use crate::url::CandidateUrl;
use std::collections::HashSet;

/// Sitemap locations already taken for fetching
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<CandidateUrl>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited; returns false if it already was
    pub fn insert(&mut self, url: CandidateUrl) -> bool {
        self.seen.insert(url)
    }

    pub fn contains(&self, url: &CandidateUrl) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Insertion-ordered set of accepted product URLs with a size cap
///
/// # Example
///
/// ```
/// use product_scout::state::AcceptedSet;
/// use product_scout::url::{normalize_url, QueryPolicy};
///
/// let mut accepted = AcceptedSet::new(2);
/// let a = normalize_url("https://x.test/p/1", QueryPolicy::Strip).unwrap();
/// assert!(accepted.insert(a.clone()));
/// assert!(!accepted.insert(a));
/// assert!(!accepted.is_full());
/// ```
#[derive(Debug)]
pub struct AcceptedSet {
    order: Vec<CandidateUrl>,
    index: HashSet<CandidateUrl>,
    capacity: usize,
}

impl AcceptedSet {
    /// Creates an empty set holding at most `capacity` URLs
    pub fn new(capacity: usize) -> Self {
        Self {
            order: Vec::new(),
            index: HashSet::new(),
            capacity,
        }
    }

    /// Inserts `url` unless it is already present or the set is full
    ///
    /// Returns true if the URL was added.
    pub fn insert(&mut self, url: CandidateUrl) -> bool {
        if self.is_full() || self.index.contains(&url) {
            return false;
        }
        self.index.insert(url.clone());
        self.order.push(url);
        true
    }

    pub fn contains(&self, url: &CandidateUrl) -> bool {
        self.index.contains(url)
    }

    /// Returns true once the cap has been reached
    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// URLs in acceptance order
    pub fn iter(&self) -> impl Iterator<Item = &CandidateUrl> {
        self.order.iter()
    }

    /// Consumes the set, yielding URLs in acceptance order
    pub fn into_strings(self) -> Vec<String> {
        self.order.into_iter().map(CandidateUrl::into_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::{normalize_url, QueryPolicy};

    fn url(s: &str) -> CandidateUrl {
        normalize_url(s, QueryPolicy::Strip).unwrap()
    }

    #[test]
    fn test_visited_insert_once() {
        let mut visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.insert(url("https://x.test/sitemap.xml")));
        assert!(!visited.insert(url("https://X.test/sitemap.xml")));
        assert!(visited.contains(&url("https://x.test/sitemap.xml")));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_accepted_preserves_order() {
        let mut accepted = AcceptedSet::new(10);
        accepted.insert(url("https://x.test/p/3"));
        accepted.insert(url("https://x.test/p/1"));
        accepted.insert(url("https://x.test/p/2"));

        assert_eq!(
            accepted.into_strings(),
            vec![
                "https://x.test/p/3",
                "https://x.test/p/1",
                "https://x.test/p/2"
            ]
        );
    }

    #[test]
    fn test_accepted_rejects_duplicates() {
        let mut accepted = AcceptedSet::new(10);
        assert!(accepted.insert(url("https://x.test/p/1")));
        assert!(!accepted.insert(url("https://x.test/p/1/")));
        assert!(!accepted.insert(url("https://x.test/p/1#reviews")));
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn test_accepted_cap() {
        let mut accepted = AcceptedSet::new(2);
        assert!(accepted.insert(url("https://x.test/p/1")));
        assert!(!accepted.is_full());
        assert!(accepted.insert(url("https://x.test/p/2")));
        assert!(accepted.is_full());
        assert!(!accepted.insert(url("https://x.test/p/3")));
        assert_eq!(accepted.len(), accepted.capacity());
        assert!(!accepted.contains(&url("https://x.test/p/3")));
    }
}

//! Depth-first sitemap traversal
//!
//! The walker keeps an explicit work stack of sitemap and page locations.
//! Popping a sitemap fetches and parses it and pushes its entries back in
//! reverse, so the next pop is the first entry in document order. Popping a
//! page emits it as a candidate (or inspects it, when page inspection is on).
//!
//! Fetches for the next few fetchable items on the stack are started ahead of
//! time, bounded by the scheduler's concurrency, but results are always
//! consumed in stack order. The emitted sequence is therefore identical for
//! every concurrency setting.

use crate::classifier::{is_static_asset, ProductClassifier};
use crate::crawler::{
    inspect_page, CrawlWarning, FetchResponse, FetchScheduler, PendingFetch, WarningKind,
};
use crate::sitemap::parser::{is_sitemap_location, parse_sitemap, SitemapKind};
use crate::state::VisitedSet;
use crate::url::{normalize_parsed, normalize_url, CandidateUrl, Domain, QueryPolicy};
use crate::{TransportError, UrlError};
use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

/// How deep into the stack prefetching looks for fetchable items
const LOOKAHEAD_SCAN_LIMIT: usize = 256;

/// Where a candidate URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Listed in a URL set
    Sitemap,
    /// An inspected page whose markup declares a product
    ProductMarkup,
    /// A same-site link on an inspected page
    PageLink,
}

/// One step of a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A sitemap was fetched and parsed; its entries are now on the stack
    SitemapParsed {
        url: CandidateUrl,
        kind: SitemapKind,
        entries: usize,
    },
    /// A leaf page was fetched for inspection
    PageInspected { url: CandidateUrl },
    /// A URL to classify
    Candidate {
        url: CandidateUrl,
        source: CandidateSource,
    },
    /// A node was skipped; nothing was emitted from it
    Skipped(CrawlWarning),
}

#[derive(Debug)]
enum WorkItem {
    Sitemap(CandidateUrl),
    Page(CandidateUrl),
}

/// Lazy, pull-based walk over one or more sitemap roots
///
/// Roots are walked in the given order, each one fully before the next.
///
/// # Example
///
/// ```no_run
/// # async fn demo(scheduler: product_scout::crawler::FetchScheduler) {
/// use product_scout::classifier::ProductClassifier;
/// use product_scout::sitemap::{SitemapWalker, WalkEvent};
/// use product_scout::state::VisitedSet;
/// use product_scout::url::Domain;
///
/// let domain = Domain::parse("https://x.test").unwrap();
/// let roots = vec!["https://x.test/sitemap.xml".to_string()];
/// let mut walker = SitemapWalker::new(domain, &roots, ProductClassifier::default(), scheduler);
/// let mut visited = VisitedSet::new();
///
/// while let Some(event) = walker.next(&mut visited).await {
///     if let WalkEvent::Candidate { url, .. } = event {
///         println!("{}", url);
///     }
/// }
/// # }
/// ```
pub struct SitemapWalker {
    domain: Domain,
    classifier: ProductClassifier,
    scheduler: FetchScheduler,
    inspect_pages: bool,
    stack: Vec<WorkItem>,
    in_flight: HashMap<CandidateUrl, PendingFetch>,
    inspected: HashSet<CandidateUrl>,
    pending: VecDeque<WalkEvent>,
}

impl SitemapWalker {
    /// Creates a walker over `roots`
    ///
    /// Roots that do not parse as URLs are reported as [`WalkEvent::Skipped`]
    /// on the first call to [`SitemapWalker::next`].
    pub fn new(
        domain: Domain,
        roots: &[String],
        classifier: ProductClassifier,
        scheduler: FetchScheduler,
    ) -> Self {
        let mut pending = VecDeque::new();
        let mut stack = Vec::with_capacity(roots.len());

        for root in roots.iter().rev() {
            match normalize_url(root, QueryPolicy::Keep) {
                Ok(url) => stack.push(WorkItem::Sitemap(url)),
                Err(e) => pending.push_front(WalkEvent::Skipped(CrawlWarning::new(
                    root.as_str(),
                    WarningKind::InvalidUrl,
                    e.to_string(),
                ))),
            }
        }

        Self {
            domain,
            classifier,
            scheduler,
            inspect_pages: false,
            stack,
            in_flight: HashMap::new(),
            inspected: HashSet::new(),
            pending,
        }
    }

    /// Fetch and inspect leaf pages that fail URL classification
    pub fn with_page_inspection(mut self, enabled: bool) -> Self {
        self.inspect_pages = enabled;
        self
    }

    /// Stops the walk; fetches not yet started never run
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
        self.in_flight.clear();
        self.stack.clear();
        self.pending.clear();
    }

    /// Produces the next event, or `None` once the walk is exhausted or cancelled
    ///
    /// `visited` guards against cycles: a sitemap location is inserted when it
    /// is taken for fetching and is never fetched again by any walk sharing
    /// the same set.
    pub async fn next(&mut self, visited: &mut VisitedSet) -> Option<WalkEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            if self.scheduler.is_cancelled() {
                self.cancel();
                return None;
            }

            match self.stack.pop()? {
                WorkItem::Sitemap(url) => {
                    if !visited.insert(url.clone()) {
                        tracing::debug!("Sitemap already visited: {}", url);
                        continue;
                    }

                    let Some(result) = self.fetch(&url, visited).await else {
                        self.cancel();
                        return None;
                    };
                    self.process_sitemap(url, result);
                }
                WorkItem::Page(url) => {
                    if !self.should_inspect(&url) {
                        return Some(WalkEvent::Candidate {
                            url,
                            source: CandidateSource::Sitemap,
                        });
                    }

                    self.inspected.insert(url.clone());
                    let Some(result) = self.fetch(&url, visited).await else {
                        self.cancel();
                        return None;
                    };
                    self.process_page(url, result);
                }
            }
        }
    }

    /// Fetches `url`, first topping up the lookahead window
    async fn fetch(
        &mut self,
        url: &CandidateUrl,
        visited: &VisitedSet,
    ) -> Option<Result<FetchResponse, TransportError>> {
        let current = match self.in_flight.remove(url) {
            Some(fetch) => fetch,
            None => self.scheduler.spawn(url.as_str()),
        };
        self.prefetch(visited);
        current.wait().await
    }

    /// Starts fetches for the next fetchable items on the stack
    fn prefetch(&mut self, visited: &VisitedSet) {
        // One permit is taken by the fetch being awaited
        let limit = self.scheduler.concurrency().saturating_sub(1);
        if self.in_flight.len() >= limit {
            return;
        }

        let mut wanted: Vec<CandidateUrl> = Vec::new();
        for item in self.stack.iter().rev().take(LOOKAHEAD_SCAN_LIMIT) {
            if self.in_flight.len() + wanted.len() >= limit {
                break;
            }
            let url = match item {
                WorkItem::Sitemap(url) if !visited.contains(url) => url,
                WorkItem::Page(url) if self.should_inspect(url) => url,
                _ => continue,
            };
            if !self.in_flight.contains_key(url) && !wanted.contains(url) {
                wanted.push(url.clone());
            }
        }

        for url in wanted {
            tracing::trace!("Prefetching {}", url);
            let fetch = self.scheduler.spawn(url.as_str());
            self.in_flight.insert(url, fetch);
        }
    }

    fn should_inspect(&self, url: &CandidateUrl) -> bool {
        self.inspect_pages
            && !self.inspected.contains(url)
            && !is_static_asset(url)
            && !self.classifier.classify(url)
            && self.domain.is_same_site(url.as_url())
    }

    fn skip(&mut self, warning: CrawlWarning) {
        tracing::warn!("Skipping {}", warning);
        self.pending.push_back(WalkEvent::Skipped(warning));
    }

    fn process_sitemap(
        &mut self,
        url: CandidateUrl,
        result: Result<FetchResponse, TransportError>,
    ) {
        let response = match result {
            Ok(response) => response,
            Err(e) => return self.skip(e.into()),
        };

        if !response.is_success() {
            return self.skip(CrawlWarning::http_status(url.as_str(), response.status));
        }

        let node = match parse_sitemap(url.as_str(), &response.body) {
            Ok(node) => node,
            Err(e) => return self.skip(e.into()),
        };

        if node.kind == SitemapKind::Unknown {
            tracing::debug!("{} is neither a sitemap index nor a URL set", url);
        }

        let mut children = Vec::with_capacity(node.locations.len());
        let mut invalid = Vec::new();
        for location in &node.locations {
            match self.child_item(node.kind, location) {
                Ok(item) => children.push(item),
                Err(e) => invalid.push(CrawlWarning::new(
                    location.as_str(),
                    WarningKind::InvalidUrl,
                    format!("in {}: {}", url, e),
                )),
            }
        }

        tracing::debug!(
            "Parsed {} {} with {} entries",
            node.kind.as_str(),
            url,
            children.len()
        );

        self.pending.push_back(WalkEvent::SitemapParsed {
            url,
            kind: node.kind,
            entries: children.len(),
        });
        for warning in invalid {
            self.skip(warning);
        }
        self.stack.extend(children.into_iter().rev());
    }

    fn child_item(&self, kind: SitemapKind, location: &str) -> Result<WorkItem, UrlError> {
        let resolved = self.domain.resolve(location)?;

        if kind == SitemapKind::Index || is_sitemap_location(resolved.path()) {
            Ok(WorkItem::Sitemap(normalize_parsed(resolved, QueryPolicy::Keep)?))
        } else {
            Ok(WorkItem::Page(normalize_parsed(
                resolved,
                self.classifier.query_policy(),
            )?))
        }
    }

    fn process_page(&mut self, url: CandidateUrl, result: Result<FetchResponse, TransportError>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => return self.skip(e.into()),
        };

        if !response.is_success() {
            return self.skip(CrawlWarning::http_status(url.as_str(), response.status));
        }

        self.pending
            .push_back(WalkEvent::PageInspected { url: url.clone() });

        let is_html = response
            .content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"));
        if !is_html {
            tracing::debug!("Not inspecting non-HTML page {}", url);
            return;
        }

        let base = Url::parse(&response.final_url).unwrap_or_else(|_| url.as_url().clone());
        let findings = inspect_page(&String::from_utf8_lossy(&response.body), &base);

        if findings.product_markup {
            tracing::debug!("Product markup found on {}", url);
            self.pending.push_back(WalkEvent::Candidate {
                url,
                source: CandidateSource::ProductMarkup,
            });
            return;
        }

        let policy = self.classifier.query_policy();
        for link in findings.links {
            if !self.domain.is_same_site(&link) {
                continue;
            }
            if let Ok(candidate) = normalize_parsed(link, policy) {
                self.pending.push_back(WalkEvent::Candidate {
                    url: candidate,
                    source: CandidateSource::PageLink,
                });
            }
        }
    }
}

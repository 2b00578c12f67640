//! Bounded fetch scheduling
//!
//! This module handles:
//! - Spawning fetches as tokio tasks
//! - Limiting concurrent fetches per crawl via a semaphore
//! - Cancelling fetches that have not started yet
//!
//! The scheduler never decides *what* to fetch; the sitemap walker picks the
//! locations and consumes results in its own order.

use crate::crawler::fetcher::{fetch_with_deadline, FetchResponse, Fetcher};
use crate::TransportError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a scheduled fetch; `None` when the crawl was cancelled before
/// the fetch started
pub type FetchOutcome = Option<Result<FetchResponse, TransportError>>;

/// A fetch that has been handed to the runtime
///
/// Dropping a `PendingFetch` detaches its task: a fetch already in flight
/// runs to completion and its result is discarded.
pub struct PendingFetch {
    url: String,
    handle: JoinHandle<FetchOutcome>,
}

impl PendingFetch {
    /// The location being fetched
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the fetch to finish
    pub async fn wait(self) -> FetchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(Err(TransportError::Request {
                url: self.url,
                message: format!("fetch task failed: {}", e),
            })),
        }
    }
}

/// Spawns fetches for one crawl under a shared concurrency limit
///
/// Cloning is cheap; clones share the semaphore and the cancellation token.
///
/// # Cancellation
///
/// Once [`FetchScheduler::cancel`] is called, tasks still waiting for a
/// permit return `None` without touching the network and new spawns resolve
/// to `None` immediately.
#[derive(Clone)]
pub struct FetchScheduler {
    fetcher: Arc<dyn Fetcher>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Duration,
    concurrency: usize,
}

impl FetchScheduler {
    /// Creates a scheduler allowing `concurrency` fetches in flight
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetch capability shared by every task
    /// * `concurrency` - Semaphore permits (clamped to at least 1)
    /// * `timeout` - Per-request timeout handed to the fetcher
    pub fn new(fetcher: Arc<dyn Fetcher>, concurrency: usize, timeout: Duration) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            cancel: CancellationToken::new(),
            timeout,
            concurrency,
        }
    }

    /// Uses `token` for cancellation instead of a fresh token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Maximum number of fetches allowed in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Stops every fetch that has not acquired a permit yet
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Spawns a fetch of `url`
    pub fn spawn(&self, url: &str) -> PendingFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let semaphore = Arc::clone(&self.semaphore);
        let cancel = self.cancel.clone();
        let timeout = self.timeout;
        let target = url.to_string();

        let handle = tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                permit = semaphore.acquire_owned() => permit.ok()?,
            };

            if cancel.is_cancelled() {
                return None;
            }

            tracing::debug!("Fetching {}", target);
            Some(fetch_with_deadline(fetcher.as_ref(), &target, timeout).await)
        });

        PendingFetch {
            url: url.to_string(),
            handle,
        }
    }
}

//! In-memory fetcher for unit tests

use crate::crawler::fetcher::{FetchResponse, Fetcher};
use crate::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct Route {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
    delay: Duration,
    fail: bool,
}

/// Serves canned responses by exact URL and records every request
///
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    routes: HashMap<String, Route>,
    log: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
                delay: Duration::ZERO,
                fail: false,
            },
        );
        self
    }

    pub fn text(self, url: &str, body: &str) -> Self {
        self.route(url, 200, "text/plain", body.as_bytes())
    }

    pub fn xml(self, url: &str, body: &str) -> Self {
        self.route(url, 200, "application/xml", body.as_bytes())
    }

    pub fn bytes(self, url: &str, body: &[u8]) -> Self {
        self.route(url, 200, "application/octet-stream", body)
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.route(url, 200, "text/html; charset=utf-8", body.as_bytes())
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.route(url, status, "text/html", b"")
    }

    /// Makes `url` fail with a connection error
    pub fn unreachable(mut self, url: &str) -> Self {
        self = self.route(url, 0, "", b"");
        if let Some(route) = self.routes.get_mut(url) {
            route.fail = true;
        }
        self
    }

    /// Delays the response of an already registered `url`
    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.get_mut(url) {
            route.delay = delay;
        }
        self
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, TransportError> {
        self.log.lock().unwrap().push(url.to_string());

        let Some(route) = self.routes.get(url) else {
            return Ok(FetchResponse {
                final_url: url.to_string(),
                status: 404,
                content_type: None,
                body: Vec::new(),
            });
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        if route.fail {
            return Err(TransportError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(FetchResponse {
            final_url: url.to_string(),
            status: route.status,
            content_type: route.content_type.clone(),
            body: route.body.clone(),
        })
    }
}

// Test mocks for the extraction seams.
//
// - MockPageClient (PageClient): HashMap-based URL→response, plus a redirect table
// - MockRenderer (PageRenderer): URL→HTML, with per-wait-condition timeouts
//
// Both record every call so tests can assert on what was requested.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessError, WaitUntil};

use crate::client::{FetchedBody, PageClient};
use crate::error::ExtractionError;
use crate::render::PageRenderer;

// ---------------------------------------------------------------------------
// MockPageClient
// ---------------------------------------------------------------------------

/// Returns `Network` errors for unregistered URLs.
/// Builder pattern: `.on_page()`, `.on_status()`, `.on_redirect()`, `.on_landing()`.
#[derive(Default)]
pub struct MockPageClient {
    pages: HashMap<String, FetchedBody>,
    redirects: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl MockPageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 200 response served at its own URL.
    pub fn on_page(self, url: &str, body: &str) -> Self {
        self.on_landing(url, url, 200, body)
    }

    pub fn on_status(self, url: &str, status: u16) -> Self {
        self.on_landing(url, url, status, "")
    }

    /// Response that arrives at `final_url` after redirects.
    pub fn on_landing(mut self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedBody {
                final_url: final_url.to_string(),
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn on_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Every URL passed to `get` or `resolve`, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, url: &str) {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
    }
}

#[async_trait]
impl PageClient for MockPageClient {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchedBody, ExtractionError> {
        self.record(url);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractionError::network(url, "MockPageClient: no page registered"))
    }

    async fn resolve(&self, url: &str, _timeout: Duration) -> Result<FetchedBody, ExtractionError> {
        self.record(url);
        if let Some(target) = self.redirects.get(url) {
            return Ok(FetchedBody {
                final_url: target.clone(),
                status: 200,
                body: String::new(),
            });
        }
        match self.pages.get(url) {
            Some(page) => Ok(FetchedBody {
                body: String::new(),
                ..page.clone()
            }),
            None => Err(ExtractionError::network(url, "MockPageClient: no redirect registered")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Returns a `Network` error for unregistered URLs.
#[derive(Default)]
pub struct MockRenderer {
    pages: HashMap<String, String>,
    timeouts: HashSet<(String, WaitUntil)>,
    calls: Mutex<Vec<(String, WaitUntil)>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_render(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Make navigation time out for this URL under one wait condition.
    pub fn timeout_on(mut self, url: &str, wait_until: WaitUntil) -> Self {
        self.timeouts.insert((url.to_string(), wait_until));
        self
    }

    pub fn calls(&self) -> Vec<(String, WaitUntil)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, wait_until: WaitUntil) -> Result<String, BrowserlessError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((url.to_string(), wait_until));
        }
        if self.timeouts.contains(&(url.to_string(), wait_until)) {
            return Err(BrowserlessError::Timeout(format!(
                "Navigation timeout of 60000 ms exceeded ({wait_until:?})"
            )));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserlessError::Network(format!("MockRenderer: no page for {url}")))
    }
}

pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Page lifecycle event Browserless waits for before considering navigation done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WaitUntil {
    #[serde(rename = "networkidle0")]
    NetworkIdle,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
}

/// Navigation settings for a single `/content` call.
#[derive(Debug, Clone, Copy)]
pub struct ContentOptions {
    pub wait_until: WaitUntil,
    pub navigation_timeout: Duration,
    /// Extra wait after navigation so client-side rendering can finish.
    pub settle: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: WaitUntil,
    timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
    wait_for_timeout: u64,
}

/// One long-lived handle to a Browserless instance. The inner HTTP client keeps
/// its connection pool across calls, so a whole pass shares one session.
pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BrowserlessError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str, options: &ContentOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = ContentRequest {
            url,
            goto_options: GotoOptions {
                wait_until: options.wait_until,
                timeout: options.navigation_timeout.as_millis() as u64,
            },
            wait_for_timeout: options.settle.as_millis() as u64,
        };

        debug!(url, wait_until = ?options.wait_until, "browserless: requesting content");

        // The service enforces the navigation timeout; the client-side bound only
        // covers a service that stops responding altogether.
        let client_timeout = options.navigation_timeout + options.settle + Duration::from_secs(10);

        let resp = self
            .client
            .post(&endpoint)
            .timeout(client_timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            if status.as_u16() == 408 || is_navigation_timeout(&message) {
                return Err(BrowserlessError::Timeout(message));
            }
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

fn is_navigation_timeout(message: &str) -> bool {
    message.contains("TimeoutError") || message.contains("Navigation timeout")
}

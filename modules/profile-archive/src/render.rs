// Headless rendering seam. Production goes through Browserless; tests swap in a mock.

use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError, ContentOptions, WaitUntil};
use profile_common::HarvestConfig;

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigate, wait for `wait_until` plus the settle interval, return the DOM as HTML.
    async fn render(&self, url: &str, wait_until: WaitUntil) -> Result<String, BrowserlessError>;
}

/// Renderer backed by one Browserless session reused for the whole pass.
pub struct BrowserlessRenderer {
    client: BrowserlessClient,
    navigation_timeout: Duration,
    settle: Duration,
}

impl BrowserlessRenderer {
    pub fn new(client: BrowserlessClient, navigation_timeout: Duration, settle: Duration) -> Self {
        Self {
            client,
            navigation_timeout,
            settle,
        }
    }

    /// Build from config. `None` when no render service is configured.
    pub fn from_config(config: &HarvestConfig) -> Result<Option<Self>, BrowserlessError> {
        let Some(base_url) = config.browserless_url.as_deref() else {
            return Ok(None);
        };
        let client = BrowserlessClient::new(base_url, config.browserless_token.as_deref())?;
        Ok(Some(Self::new(
            client,
            config.render_timeout(),
            config.render_settle(),
        )))
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str, wait_until: WaitUntil) -> Result<String, BrowserlessError> {
        let options = ContentOptions {
            wait_until,
            navigation_timeout: self.navigation_timeout,
            settle: self.settle,
        };
        self.client.content(url, &options).await
    }
}

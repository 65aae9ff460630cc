use std::sync::Arc;

use async_trait::async_trait;
use browserless_client::{BrowserlessError, WaitUntil};
use tracing::warn;

use super::{ContentExtractor, Extracted};
use crate::error::ExtractionError;
use crate::render::PageRenderer;
use crate::text_extract::html_to_text;

/// Client-rendered pages. Waits for network idle first; a navigation timeout is
/// retried once waiting only for DOM ready. A second timeout is a network error.
pub struct HeadlessRender {
    renderer: Arc<dyn PageRenderer>,
}

impl HeadlessRender {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl ContentExtractor for HeadlessRender {
    fn name(&self) -> &'static str {
        "headless_render"
    }

    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError> {
        let html = match self.renderer.render(url, WaitUntil::NetworkIdle).await {
            Ok(html) => html,
            Err(e) if e.is_timeout() => {
                warn!(url, "Render timed out waiting for network idle, retrying on DOM ready");
                self.renderer
                    .render(url, WaitUntil::DomContentLoaded)
                    .await
                    .map_err(|e| render_error(url, e))?
            }
            Err(e) => return Err(render_error(url, e)),
        };
        Ok(Extracted {
            text: html_to_text(&html),
            raw: html,
        })
    }
}

fn render_error(url: &str, e: BrowserlessError) -> ExtractionError {
    match e {
        BrowserlessError::Timeout(_) => ExtractionError::network(url, "render timed out"),
        other => ExtractionError::network(url, other.to_string()),
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ContentExtractor, Extracted};
use crate::client::{require_content, PageClient};
use crate::error::ExtractionError;
use crate::text_extract::html_to_text;

/// Plain GET, visible text of the returned HTML.
pub struct GenericHtml {
    client: Arc<dyn PageClient>,
    timeout: Duration,
}

impl GenericHtml {
    pub fn new(client: Arc<dyn PageClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ContentExtractor for GenericHtml {
    fn name(&self) -> &'static str {
        "generic_html"
    }

    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError> {
        let fetched = require_content(url, self.client.get(url, self.timeout).await?)?;
        let text = html_to_text(&fetched.body);
        debug!(url, bytes = fetched.body.len(), "Extracted visible text");
        Ok(Extracted {
            text,
            raw: fetched.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageClient;

    fn extractor(client: MockPageClient) -> GenericHtml {
        GenericHtml::new(Arc::new(client), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn keeps_raw_body_alongside_text() {
        let html = "<html><body><p>I like hiking</p></body></html>";
        let client = MockPageClient::new().on_page("https://alice.example", html);
        let extracted = extractor(client).extract("https://alice.example").await.unwrap();
        assert_eq!(extracted.text, "I like hiking");
        assert_eq!(extracted.raw, html);
    }

    #[tokio::test]
    async fn non_success_status_is_an_http_error() {
        let client = MockPageClient::new().on_status("https://alice.example", 404);
        let err = extractor(client).extract("https://alice.example").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn login_redirect_is_auth_required() {
        let client = MockPageClient::new().on_landing(
            "https://www.dropbox.com/s/abc/me.pdf",
            "https://www.dropbox.com/login?cont=abc",
            200,
            "<p>Sign in</p>",
        );
        let err = extractor(client)
            .extract("https://www.dropbox.com/s/abc/me.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::AuthRequired(_)));
    }
}

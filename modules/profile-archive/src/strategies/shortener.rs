use std::sync::Arc;
use std::time::Duration;

use crate::client::{require_content, PageClient};
use crate::error::ExtractionError;
use crate::router::canonical_url;

/// Link shorteners: follow redirects to find the real document URL. Extraction
/// itself is delegated by the dispatcher once the target is reclassified.
pub struct ShortenerExpand {
    client: Arc<dyn PageClient>,
    timeout: Duration,
}

impl ShortenerExpand {
    pub fn new(client: Arc<dyn PageClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The redirect target. A dead link keeps its HTTP status; a link that
    /// answers without redirecting has nothing to expand.
    pub async fn expand(&self, url: &str) -> Result<String, ExtractionError> {
        let landed = require_content(url, self.client.resolve(url, self.timeout).await?)?;
        let resolved = landed.final_url;
        if resolved.trim().is_empty() {
            return Err(ExtractionError::Parse(format!("{url} resolved to an empty URL")));
        }
        if canonical_url(&resolved) == canonical_url(url) {
            return Err(ExtractionError::Parse(format!("{url} did not redirect anywhere")));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageClient;

    #[tokio::test]
    async fn follows_redirects() {
        let client = MockPageClient::new().on_redirect("https://bit.ly/abc", "https://notion.so/xyz");
        let expander = ShortenerExpand::new(Arc::new(client), Duration::from_secs(5));
        assert_eq!(
            expander.expand("https://bit.ly/abc").await.unwrap(),
            "https://notion.so/xyz"
        );
    }

    #[tokio::test]
    async fn dead_link_keeps_its_status() {
        let client = MockPageClient::new().on_status("https://bit.ly/dead", 404);
        let expander = ShortenerExpand::new(Arc::new(client), Duration::from_secs(5));
        let err = expander.expand("https://bit.ly/dead").await.unwrap_err();
        assert_eq!(
            err,
            ExtractionError::HttpStatus {
                url: "https://bit.ly/dead".into(),
                status: 404
            }
        );
    }

    #[tokio::test]
    async fn link_without_redirect_is_not_expanded() {
        let client = MockPageClient::new().on_page("https://bit.ly/home", "<p>bitly</p>");
        let expander = ShortenerExpand::new(Arc::new(client), Duration::from_secs(5));
        let err = expander.expand("https://bit.ly/home").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(ref d) if d.contains("did not redirect")));
    }

    #[tokio::test]
    async fn unreachable_shortener_is_network_error() {
        let expander = ShortenerExpand::new(Arc::new(MockPageClient::new()), Duration::from_secs(5));
        let err = expander.expand("https://bit.ly/gone").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Network { .. }));
    }
}

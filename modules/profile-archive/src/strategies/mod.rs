// Extraction strategies and the platform-driven dispatcher that picks one per URL.

mod document_export;
mod generic_html;
mod headless;
mod shortener;

pub use document_export::{export_url, DocumentExport};
pub use generic_html::GenericHtml;
pub use headless::HeadlessRender;
pub use shortener::ShortenerExpand;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use profile_common::PlatformTag;
use tracing::info;

use crate::client::PageClient;
use crate::error::ExtractionError;
use crate::render::PageRenderer;
use crate::router::PlatformClassifier;

/// Text pulled out of one document, plus the raw body it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub raw: String,
}

/// One way of turning a URL into document text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError>;
}

/// How the dispatcher picks a strategy after shortener expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// Per platform: export for Google Docs, render for render platforms, plain HTML otherwise.
    #[default]
    ByPlatform,
    /// Headless render for every URL.
    RenderAll,
}

/// Result of a successful fetch for one record.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    pub text: String,
    pub raw: String,
    /// Platform of the URL that was actually read (post-expansion).
    pub platform: PlatformTag,
    /// Set only when a shortener was expanded.
    pub expanded_url: Option<String>,
    pub strategy: &'static str,
}

/// Classifier plus one instance of every strategy. Rendering is optional; platforms
/// that need it fail with `Unsupported` when no renderer is configured.
pub struct ExtractorSet {
    classifier: PlatformClassifier,
    generic: GenericHtml,
    export: DocumentExport,
    shortener: ShortenerExpand,
    headless: Option<HeadlessRender>,
    mode: RoutingMode,
}

impl ExtractorSet {
    pub fn new(
        classifier: PlatformClassifier,
        client: Arc<dyn PageClient>,
        renderer: Option<Arc<dyn PageRenderer>>,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            generic: GenericHtml::new(client.clone(), timeout),
            export: DocumentExport::new(client.clone(), timeout),
            shortener: ShortenerExpand::new(client, timeout),
            headless: renderer.map(HeadlessRender::new),
            mode: RoutingMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: RoutingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn classifier(&self) -> &PlatformClassifier {
        &self.classifier
    }

    /// Classify, expand a shortener if needed, then extract with the selected strategy.
    pub async fn fetch(&self, url: Option<&str>) -> Result<FetchAttempt, ExtractionError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ExtractionError::MissingUrl)?;

        let mut platform = self.classifier.classify(Some(url));
        let mut expanded_url = None;
        if platform == PlatformTag::Shortener {
            let resolved = self.shortener.expand(url).await?;
            let resolved_platform = self.classifier.classify(Some(&resolved));
            if resolved_platform == PlatformTag::Shortener {
                return Err(ExtractionError::Parse(format!(
                    "{url} expanded to another shortener: {resolved}"
                )));
            }
            info!(url, expanded = resolved.as_str(), platform = %resolved_platform, "Expanded shortener");
            platform = resolved_platform;
            expanded_url = Some(resolved);
        }

        let target = expanded_url.as_deref().unwrap_or(url);
        let extractor = self.select(platform)?;
        let extracted = extractor.extract(target).await?;

        Ok(FetchAttempt {
            text: extracted.text,
            raw: extracted.raw,
            platform,
            expanded_url,
            strategy: extractor.name(),
        })
    }

    fn select(&self, platform: PlatformTag) -> Result<&dyn ContentExtractor, ExtractionError> {
        if self.mode == RoutingMode::RenderAll || self.classifier.needs_render(platform) {
            return match &self.headless {
                Some(headless) => Ok(headless),
                None => Err(ExtractionError::Unsupported(platform)),
            };
        }
        if platform == PlatformTag::GoogleDocs {
            return Ok(&self.export);
        }
        Ok(&self.generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPageClient, MockRenderer};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn set(client: MockPageClient, renderer: Option<MockRenderer>) -> ExtractorSet {
        ExtractorSet::new(
            PlatformClassifier::default(),
            Arc::new(client),
            renderer.map(|r| Arc::new(r) as Arc<dyn PageRenderer>),
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn missing_url_is_reported_before_any_request() {
        let extractors = set(MockPageClient::new(), None);
        assert_eq!(
            extractors.fetch(Some("  ")).await.unwrap_err(),
            ExtractionError::MissingUrl
        );
        assert_eq!(extractors.fetch(None).await.unwrap_err(), ExtractionError::MissingUrl);
    }

    #[tokio::test]
    async fn shortener_expands_then_delegates_to_renderer() {
        let client = MockPageClient::new().on_redirect("https://bit.ly/abc", "https://notion.so/xyz");
        let renderer = MockRenderer::new().on_render(
            "https://notion.so/xyz",
            "<html><body><p>Hello from Notion</p></body></html>",
        );
        let attempt = set(client, Some(renderer))
            .fetch(Some("https://bit.ly/abc"))
            .await
            .unwrap();

        assert_eq!(attempt.platform, PlatformTag::Notion);
        assert_eq!(attempt.expanded_url.as_deref(), Some("https://notion.so/xyz"));
        assert_eq!(attempt.strategy, "headless_render");
        assert_eq!(attempt.text, "Hello from Notion");
    }

    #[tokio::test]
    async fn shortener_chains_are_parse_errors() {
        let client = MockPageClient::new().on_redirect("https://bit.ly/a", "https://tinyurl.com/b");
        let err = set(client, None).fetch(Some("https://bit.ly/a")).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[tokio::test]
    async fn render_platform_without_renderer_is_unsupported() {
        let err = set(MockPageClient::new(), None)
            .fetch(Some("https://www.notion.so/me"))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::Unsupported(PlatformTag::Notion));
    }

    #[tokio::test]
    async fn google_docs_route_to_export() {
        let client = MockPageClient::new().on_page(
            "https://docs.google.com/document/d/ABC123/export?format=txt",
            "Plain text body",
        );
        let attempt = set(client, None)
            .fetch(Some("https://docs.google.com/document/d/ABC123/edit"))
            .await
            .unwrap();
        assert_eq!(attempt.strategy, "document_export");
        assert_eq!(attempt.text, "Plain text body");
        assert!(attempt.expanded_url.is_none());
    }

    #[tokio::test]
    async fn render_all_sends_plain_sites_to_renderer() {
        let renderer = MockRenderer::new().on_render("https://alice.example", "<p>rendered</p>");
        let attempt = set(MockPageClient::new(), Some(renderer))
            .with_mode(RoutingMode::RenderAll)
            .fetch(Some("https://alice.example"))
            .await
            .unwrap();
        assert_eq!(attempt.platform, PlatformTag::CustomSite);
        assert_eq!(attempt.strategy, "headless_render");
    }

    #[tokio::test]
    async fn everything_else_is_generic_html() {
        let client = MockPageClient::new().on_page(
            "https://alice.example/about",
            "<html><body><h1>Alice</h1><script>x()</script></body></html>",
        );
        let attempt = set(client, None)
            .fetch(Some("https://alice.example/about"))
            .await
            .unwrap();
        assert_eq!(attempt.strategy, "generic_html");
        assert_eq!(attempt.text, "Alice");
    }
}

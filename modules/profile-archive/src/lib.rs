pub mod client;
pub mod error;
pub mod render;
pub mod router;
pub mod strategies;
pub mod text_extract;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{FetchedBody, HttpPageClient, PageClient};
pub use error::ExtractionError;
pub use render::{BrowserlessRenderer, PageRenderer};
pub use router::{canonical_url, PlatformClassifier, PlatformRules};
pub use strategies::{
    ContentExtractor, DocumentExport, Extracted, ExtractorSet, FetchAttempt, GenericHtml,
    HeadlessRender, RoutingMode, ShortenerExpand,
};
pub use text_extract::html_to_text;

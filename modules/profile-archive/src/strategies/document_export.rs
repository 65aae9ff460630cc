use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::{ContentExtractor, Extracted};
use crate::client::{require_content, PageClient};
use crate::error::ExtractionError;

static DOCUMENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/document/(?:u/\d+/)?d/([A-Za-z0-9_-]+)").expect("valid regex")
});

/// Plain-text export URL for a Google Docs document link, if it carries an id.
pub fn export_url(url: &str) -> Option<String> {
    let id = DOCUMENT_ID_RE.captures(url)?.get(1)?.as_str();
    Some(format!(
        "https://docs.google.com/document/d/{id}/export?format=txt"
    ))
}

/// Google Docs: fetch the `format=txt` export instead of the editor page.
/// The export body is already plain text and is used verbatim.
pub struct DocumentExport {
    client: Arc<dyn PageClient>,
    timeout: Duration,
}

impl DocumentExport {
    pub fn new(client: Arc<dyn PageClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ContentExtractor for DocumentExport {
    fn name(&self) -> &'static str {
        "document_export"
    }

    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError> {
        let export = export_url(url)
            .ok_or_else(|| ExtractionError::Parse(format!("No document id in {url}")))?;
        let fetched = require_content(&export, self.client.get(&export, self.timeout).await?)?;
        Ok(Extracted {
            text: fetched.body.clone(),
            raw: fetched.body,
        })
    }
}

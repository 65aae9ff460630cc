// Fixtures for pass-level tests. Extraction mocks live in `profile_archive::testing`.

use std::sync::Arc;
use std::time::Duration;

use profile_archive::testing::{MockPageClient, MockRenderer};
use profile_archive::{ExtractorSet, PageRenderer, PlatformClassifier};
use profile_common::{DirectoryRow, ProfileRecord};

/// A never-fetched record with the given id and URL.
pub fn record(id: &str, url: Option<&str>) -> ProfileRecord {
    ProfileRecord::from_row(
        id.to_string(),
        DirectoryRow {
            name: format!("name-{id}"),
            profile_url: url.map(String::from),
            ..Default::default()
        },
    )
}

/// A record that already holds `text`.
pub fn record_with_text(id: &str, url: &str, text: &str) -> ProfileRecord {
    let mut r = record(id, Some(url));
    r.profile_details.full_text = text.to_string();
    r.doc_accessible = true;
    r
}

/// `n` distinct words.
pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
}

/// `words(n)` wrapped in a minimal HTML page.
pub fn html_page(n: usize) -> String {
    format!("<html><body><p>{}</p></body></html>", words(n))
}

/// Standard classifier over the given mocks.
pub fn extractor_set(client: MockPageClient, renderer: Option<MockRenderer>) -> ExtractorSet {
    ExtractorSet::new(
        PlatformClassifier::default(),
        Arc::new(client),
        renderer.map(|r| Arc::new(r) as Arc<dyn PageRenderer>),
        Duration::from_secs(5),
    )
}

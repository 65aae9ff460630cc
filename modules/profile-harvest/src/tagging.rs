use std::collections::BTreeMap;

use profile_archive::PlatformClassifier;
use profile_common::{PlatformTag, ProfileRecord};

/// Re-tag every record from its effective URL. Returns per-tag counts.
pub fn tag_platforms(
    records: &mut [ProfileRecord],
    classifier: &PlatformClassifier,
) -> BTreeMap<PlatformTag, usize> {
    let mut counts = BTreeMap::new();
    for record in records.iter_mut() {
        let tag = classifier.classify(record.effective_url());
        record.doc_platform = Some(tag);
        *counts.entry(tag).or_insert(0) += 1;
    }
    counts
}

/// Counts ordered by frequency, most common first; ties by tag name.
pub fn ranked(counts: &BTreeMap<PlatformTag, usize>) -> Vec<(PlatformTag, usize)> {
    let mut ranked: Vec<_> = counts.iter().map(|(tag, n)| (*tag, *n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_common::DirectoryRow;

    fn record(url: Option<&str>) -> ProfileRecord {
        ProfileRecord::from_row(
            "usr_x".into(),
            DirectoryRow {
                profile_url: url.map(String::from),
                ..Default::default()
            },
        )
    }

    #[test]
    fn tags_prefer_expanded_url() {
        let mut shortened = record(Some("https://bit.ly/x"));
        shortened.expanded_url = Some("https://docs.google.com/document/d/1/edit".into());
        let mut records = vec![
            shortened,
            record(None),
            record(Some("https://alice.example")),
            record(Some("https://bob.example")),
        ];
        let counts = tag_platforms(&mut records, &PlatformClassifier::default());

        assert_eq!(records[0].doc_platform, Some(PlatformTag::GoogleDocs));
        assert_eq!(records[1].doc_platform, Some(PlatformTag::MissingUrl));
        assert_eq!(
            ranked(&counts),
            vec![
                (PlatformTag::CustomSite, 2),
                (PlatformTag::GoogleDocs, 1),
                (PlatformTag::MissingUrl, 1),
            ]
        );
    }
}

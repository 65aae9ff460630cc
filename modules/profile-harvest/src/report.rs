// Before/after comparison of two stores.

use std::collections::HashMap;

use profile_common::{word_count, PlatformTag, ProfileRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRow {
    pub id: String,
    pub name: String,
    pub doc_platform: Option<PlatformTag>,
    pub profile_url: Option<String>,
    pub expanded_url: Option<String>,
    pub old_words: usize,
    pub new_words: usize,
    pub delta_words: i64,
    pub expanded_changed: bool,
}

/// Records present in both stores whose word count grew by at least `min_gain`
/// or whose expanded URL changed. Largest gains first.
pub fn report_changes(
    before: &[ProfileRecord],
    after: &[ProfileRecord],
    min_gain: usize,
) -> Vec<ChangeRow> {
    let before_by_id: HashMap<&str, &ProfileRecord> =
        before.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut rows: Vec<ChangeRow> = after
        .iter()
        .filter_map(|new| {
            let old = before_by_id.get(new.id.as_str())?;
            let old_words = word_count(old.full_text());
            let new_words = word_count(new.full_text());
            let expanded_changed = old.expanded_url.as_deref().unwrap_or_default()
                != new.expanded_url.as_deref().unwrap_or_default();
            let improved = new_words >= old_words + min_gain;
            (improved || expanded_changed).then(|| ChangeRow {
                id: new.id.clone(),
                name: new.name.clone(),
                doc_platform: new.doc_platform,
                profile_url: new.profile_url.clone(),
                expanded_url: new.expanded_url.clone(),
                old_words,
                new_words,
                delta_words: new_words as i64 - old_words as i64,
                expanded_changed,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.delta_words
            .cmp(&a.delta_words)
            .then_with(|| b.new_words.cmp(&a.new_words))
    });
    rows
}

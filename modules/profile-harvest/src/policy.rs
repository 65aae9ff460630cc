// Which records a rescrape pass should touch.

use profile_archive::PlatformClassifier;
use profile_common::{word_count, ProfileRecord};

/// Records whose text says the person is deliberately short or off the market.
/// Such text is treated as final and not rescraped.
///
/// The phrase list is an operator heuristic, not a confirmed product rule.
/// Keep it explicit here so it can be reviewed and tested on its own.
#[derive(Debug, Clone)]
pub struct RescrapeHoldPolicy {
    phrases: Vec<String>,
}

impl RescrapeHoldPolicy {
    pub fn standard() -> Self {
        Self::new([
            "not currently looking",
            "no longer seeking",
            "i've met someone",
            "i'm seeing someone",
        ])
    }

    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| normalize(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// The phrase that holds this text, if any. Matching ignores case and apostrophe style.
    pub fn hold_phrase(&self, text: &str) -> Option<&str> {
        let haystack = normalize(text);
        self.phrases
            .iter()
            .find(|phrase| haystack.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for RescrapeHoldPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Indices chosen for a rescrape pass, plus how many were held back by policy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    pub indices: Vec<usize>,
    pub held: usize,
}

/// Records with fewer than `min_words` words that the hold policy does not hold.
pub fn select_short(
    records: &[ProfileRecord],
    min_words: usize,
    policy: &RescrapeHoldPolicy,
) -> Selection {
    let mut selection = Selection::default();
    for (i, record) in records.iter().enumerate() {
        if word_count(record.full_text()) >= min_words {
            continue;
        }
        if policy.hold_phrase(record.full_text()).is_some() {
            selection.held += 1;
            continue;
        }
        selection.indices.push(i);
    }
    selection
}

/// Records whose effective URL lands on a platform that needs rendering,
/// optionally limited to those still under `min_words`.
pub fn select_render(
    records: &[ProfileRecord],
    classifier: &PlatformClassifier,
    min_words: Option<usize>,
) -> Selection {
    let indices = records
        .iter()
        .enumerate()
        .filter(|(_, r)| classifier.needs_render(classifier.classify(r.effective_url())))
        .filter(|(_, r)| min_words.map_or(true, |min| word_count(r.full_text()) < min))
        .map(|(i, _)| i)
        .collect();
    Selection { indices, held: 0 }
}

/// Everything a forced render pass should touch: records under `min_words`
/// (all records when unset) whatever their platform, minus held ones.
pub fn select_render_all(
    records: &[ProfileRecord],
    min_words: Option<usize>,
    policy: &RescrapeHoldPolicy,
) -> Selection {
    select_short(records, min_words.unwrap_or(usize::MAX), policy)
}

/// Mutable references to the selected records, in store order.
pub fn subset_mut<'a>(
    records: &'a mut [ProfileRecord],
    indices: &[usize],
) -> Vec<&'a mut ProfileRecord> {
    let wanted: std::collections::HashSet<usize> = indices.iter().copied().collect();
    records
        .iter_mut()
        .enumerate()
        .filter(|(i, _)| wanted.contains(i))
        .map(|(_, r)| r)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_common::DirectoryRow;

    fn record(url: &str, text: &str) -> ProfileRecord {
        let mut r = ProfileRecord::from_row(
            "usr_x".to_string(),
            DirectoryRow {
                profile_url: Some(url.to_string()),
                ..Default::default()
            },
        );
        r.profile_details.full_text = text.to_string();
        r
    }

    #[test]
    fn holds_ignore_case_and_curly_apostrophes() {
        let policy = RescrapeHoldPolicy::standard();
        assert_eq!(
            policy.hold_phrase("Update: I\u{2019}ve MET someone!"),
            Some("i've met someone")
        );
        assert!(policy.hold_phrase("Not currently looking, sorry").is_some());
        assert!(policy.hold_phrase("Looking for someone kind").is_none());
    }

    #[test]
    fn short_selection_excludes_held_and_long() {
        let records = vec![
            record("https://a", "tiny"),
            record("https://b", "no longer seeking"),
            record("https://c", &"word ".repeat(150)),
            record("https://d", ""),
        ];
        let selection = select_short(&records, 100, &RescrapeHoldPolicy::standard());
        assert_eq!(selection.indices, vec![0, 3]);
        assert_eq!(selection.held, 1);
    }

    #[test]
    fn render_selection_uses_expanded_url() {
        let mut shortened = record("https://bit.ly/abc", "");
        shortened.expanded_url = Some("https://www.notion.so/abc".into());
        let records = vec![
            record("https://www.notion.so/me", &"word ".repeat(500)),
            shortened,
            record("https://docs.google.com/document/d/1/edit", ""),
        ];
        let classifier = PlatformClassifier::default();
        assert_eq!(select_render(&records, &classifier, None).indices, vec![0, 1]);
        assert_eq!(select_render(&records, &classifier, Some(100)).indices, vec![1]);
    }

    #[test]
    fn render_all_ignores_platform_but_keeps_holds() {
        let records = vec![
            record("https://alice.example/about", "short"),
            record("https://www.notion.so/me", &"word ".repeat(500)),
            record("https://bob.example", "I'm seeing someone now"),
        ];
        let policy = RescrapeHoldPolicy::standard();
        let limited = select_render_all(&records, Some(100), &policy);
        assert_eq!(limited.indices, vec![0]);
        assert_eq!(limited.held, 1);
        assert_eq!(select_render_all(&records, None, &policy).indices, vec![0, 1]);
    }

    #[test]
    fn subset_keeps_store_order() {
        let mut records = vec![record("a", "1"), record("b", "2"), record("c", "3")];
        let subset = subset_mut(&mut records, &[2, 0]);
        let urls: Vec<_> = subset.iter().map(|r| r.url().unwrap_or_default()).collect();
        assert_eq!(urls, vec!["a", "c"]);
    }
}

// Merge gate: fetched text replaces stored text only when it carries strictly more signal.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use profile_common::{word_count, PlatformTag, ProfileRecord};

/// Accept iff the candidate has at least `min_gain` more words than `old` and is non-empty.
pub fn accepts(old: &str, candidate: &str, min_gain: usize) -> bool {
    let new_words = word_count(candidate);
    new_words > 0 && new_words >= word_count(old) + min_gain
}

/// Pure merge: whether the candidate won, and the text that should be stored.
pub fn merge(old: &str, candidate: &str, min_gain: usize) -> (bool, String) {
    if accepts(old, candidate, min_gain) {
        (true, candidate.to_string())
    } else {
        (false, old.to_string())
    }
}

/// Text plus the auxiliary fields of the fetch that produced it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub expanded_url: Option<String>,
    pub platform: Option<PlatformTag>,
    pub fetched_at: DateTime<Utc>,
}

impl Candidate {
    /// Candidate carried by a record from another store (e.g. a rescrape output file).
    pub fn from_record(update: &ProfileRecord, now: DateTime<Utc>) -> Self {
        Self {
            text: update.full_text().to_string(),
            expanded_url: update
                .expanded_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from),
            platform: update.doc_platform,
            fetched_at: update.scrape_timestamp_detail.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDecision {
    pub accepted: bool,
    pub old_words: usize,
    pub new_words: usize,
}

/// Apply a candidate to a record. On rejection the record is not touched at all.
pub fn apply(record: &mut ProfileRecord, candidate: Candidate, min_gain: usize) -> MergeDecision {
    let old_words = word_count(record.full_text());
    let new_words = word_count(&candidate.text);
    let accepted = accepts(record.full_text(), &candidate.text, min_gain);

    if accepted {
        record.profile_details.full_text = candidate.text;
        record.doc_accessible = true;
        record.scrape_timestamp_detail = Some(candidate.fetched_at);
        if let Some(expanded) = candidate.expanded_url {
            record.expanded_url = Some(expanded);
        }
        if let Some(platform) = candidate.platform {
            record.doc_platform = Some(platform);
        }
    }

    MergeDecision {
        accepted,
        old_words,
        new_words,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeStats {
    pub updates_seen: usize,
    pub matched: usize,
    pub improved: usize,
    pub missing_from_base: usize,
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Merge: {} updates, {} matched, {} improved, {} not in base",
            self.updates_seen, self.matched, self.improved, self.missing_from_base,
        )
    }
}

/// Merge an update store into a base store by id.
pub fn merge_by_id(
    base: &mut [ProfileRecord],
    updates: &[ProfileRecord],
    min_gain: usize,
    now: DateTime<Utc>,
) -> MergeStats {
    let index: HashMap<String, usize> = base
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    let mut stats = MergeStats::default();
    for update in updates {
        stats.updates_seen += 1;
        let Some(&i) = index.get(&update.id) else {
            stats.missing_from_base += 1;
            continue;
        };
        stats.matched += 1;
        if apply(&mut base[i], Candidate::from_record(update, now), min_gain).accepted {
            stats.improved += 1;
        }
    }
    stats
}

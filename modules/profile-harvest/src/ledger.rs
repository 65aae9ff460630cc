// Per-pass skip ledger and the end-of-pass summary built from it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use profile_common::{HarvestError, SkipReason, SkipRecord};

use crate::store;

/// One skip per row per pass; rows are keyed by id, falling back to URL.
#[derive(Debug, Default)]
pub struct SkipLedger {
    records: Vec<SkipRecord>,
    seen: HashSet<String>,
}

impl SkipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skip. Returns false when this row already has one.
    pub fn push(&mut self, record: SkipRecord) -> bool {
        let key = [&record.id, &record.url]
            .into_iter()
            .flatten()
            .find(|k| !k.trim().is_empty())
            .cloned();
        if let Some(key) = key {
            if !self.seen.insert(key) {
                return false;
            }
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SkipRecord] {
        &self.records
    }

    pub fn counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn save(&self, path: &Path) -> Result<(), HarvestError> {
        store::write_json(path, &self.records)
    }
}

/// Outcome counts for one pass. `improved + unchanged + skipped == processed`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub total: usize,
    pub processed: usize,
    pub improved: usize,
    pub unchanged: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl PassSummary {
    pub fn successes(&self) -> usize {
        self.improved + self.unchanged
    }

    pub fn skips(&self) -> usize {
        self.skipped.values().sum()
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pass: {}/{} processed, {} improved, {} unchanged, {} skipped",
            self.processed,
            self.total,
            self.improved,
            self.unchanged,
            self.skips(),
        )?;
        if !self.skipped.is_empty() {
            let reasons: Vec<String> = self
                .skipped
                .iter()
                .map(|(reason, n)| format!("{reason}={n}"))
                .collect();
            write!(f, " ({})", reasons.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_skip_per_row() {
        let mut ledger = SkipLedger::new();
        assert!(ledger.push(SkipRecord::new(Some("usr_1"), None, SkipReason::MissingUrl)));
        assert!(!ledger.push(SkipRecord::new(Some("usr_1"), None, SkipReason::NetworkError)));
        assert!(ledger.push(SkipRecord::new(None, Some("https://x"), SkipReason::ParseError)));
        assert!(!ledger.push(SkipRecord::new(None, Some("https://x"), SkipReason::ParseError)));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.counts()[&SkipReason::MissingUrl], 1);
    }

    #[test]
    fn blank_ids_fall_back_to_url() {
        let mut ledger = SkipLedger::new();
        assert!(ledger.push(SkipRecord::new(Some(""), Some("https://a"), SkipReason::NetworkError)));
        assert!(ledger.push(SkipRecord::new(Some(""), Some("https://b"), SkipReason::NetworkError)));
        assert!(!ledger.push(SkipRecord::new(Some(" "), Some("https://a"), SkipReason::ParseError)));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn summary_lists_reasons() {
        let summary = PassSummary {
            total: 4,
            processed: 4,
            improved: 1,
            unchanged: 1,
            skipped: BTreeMap::from([(SkipReason::NetworkError, 1), (SkipReason::HttpStatus, 1)]),
        };
        assert_eq!(summary.successes() + summary.skips(), summary.processed);
        assert_eq!(
            summary.to_string(),
            "Pass: 4/4 processed, 1 improved, 1 unchanged, 2 skipped (network_error=1, http_status=1)"
        );
    }

    #[test]
    fn ledger_serializes_status_only_for_http_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skipped.json");
        let mut ledger = SkipLedger::new();
        ledger.push(
            SkipRecord::new(Some("usr_1"), Some("https://x"), SkipReason::HttpStatus)
                .with_status(403),
        );
        ledger.push(SkipRecord::new(Some("usr_2"), None, SkipReason::MissingUrl));
        ledger.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["reason"], "http_status");
        assert_eq!(value[0]["status"], 403);
        assert!(value[1].get("status").is_none());
    }
}

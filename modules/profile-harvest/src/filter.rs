use std::collections::HashSet;

use profile_common::{ProfileRecord, SkipRecord};

/// Drop every record named in the skip ledger, by id or by URL.
/// Returns the kept records and how many were dropped.
pub fn filter_unusable(
    records: Vec<ProfileRecord>,
    skipped: &[SkipRecord],
) -> (Vec<ProfileRecord>, usize) {
    let ids: HashSet<&str> = skipped.iter().filter_map(|s| s.id.as_deref()).collect();
    let urls: HashSet<&str> = skipped.iter().filter_map(|s| s.url.as_deref()).collect();

    let before = records.len();
    let kept: Vec<ProfileRecord> = records
        .into_iter()
        .filter(|r| {
            let by_id = ids.contains(r.id.as_str());
            let by_url = [r.url(), r.expanded_url.as_deref()]
                .into_iter()
                .flatten()
                .any(|u| urls.contains(u));
            !(by_id || by_url)
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_common::{DirectoryRow, SkipReason};

    fn record(id: &str, url: &str) -> ProfileRecord {
        ProfileRecord::from_row(
            id.to_string(),
            DirectoryRow {
                profile_url: Some(url.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn drops_by_id_or_url() {
        let records = vec![
            record("usr_1", "https://a"),
            record("usr_2", "https://b"),
            record("usr_3", "https://c"),
        ];
        let skipped = vec![
            SkipRecord::new(Some("usr_1"), None, SkipReason::MissingUrl),
            SkipRecord::new(None, Some("https://c"), SkipReason::HttpStatus),
        ];
        let (kept, dropped) = filter_unusable(records, &skipped);
        assert_eq!(dropped, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "usr_2");
    }
}

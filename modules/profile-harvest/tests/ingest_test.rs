//! Directory ingestion: id stability and store preservation across runs.

use std::collections::HashSet;

use profile_common::DirectoryRow;
use chrono::Utc;
use profile_common::ProfileRecord;
use profile_harvest::ingest::{closed_ids, ingest};
use profile_harvest::move_to_bucket;
use profile_harvest::store::{load_json_or_empty, load_store, write_json};

fn rows() -> Vec<DirectoryRow> {
    serde_json::from_str(
        r#"[
            {"name": "Ana", "age": 31, "gender": "woman", "interestedIn": ["men"],
             "location": "Berlin", "profileUrl": "https://docs.google.com/document/d/A/edit"},
            {"name": "Ben", "age": "40", "gender": "man", "interestedIn": "women men",
             "location": "Oslo", "profileUrl": "https://bit.ly/ben"},
            {"name": "", "profileUrl": "https://broken.example"},
            {"name": "Cy", "location": "Lima"}
        ]"#,
    )
    .unwrap()
}

#[test]
fn ids_are_identical_across_runs() {
    let ids = || -> Vec<String> {
        ingest(rows(), Vec::new(), &HashSet::new())
            .records
            .into_iter()
            .map(|r| r.id)
            .collect()
    };
    let (first, second) = (ids(), ids());
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn reingest_into_existing_store_adds_nothing_new() {
    let first = ingest(rows(), Vec::new(), &HashSet::new());
    let mut store = first.records;
    store[1].profile_details.full_text = "kept".into();

    let second = ingest(rows(), store, &HashSet::new());
    assert_eq!(second.added, 0);
    assert_eq!(second.refreshed, 3);
    assert_eq!(second.records.len(), 3);
    assert_eq!(second.records[1].full_text(), "kept");
    assert_eq!(second.ledger.len(), 1);
}

#[test]
fn closed_profile_is_not_resurrected_by_reingest() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("profiles.json");
    let bucket_path = dir.path().join("closed.json");

    let mut active = ingest(rows(), Vec::new(), &HashSet::new()).records;
    let mut bucket = Vec::new();
    let closed_id = active[0].id.clone();
    move_to_bucket(&closed_id, &mut active, &mut bucket, "account deleted", Utc::now()).unwrap();
    write_json(&store_path, &active).unwrap();
    write_json(&bucket_path, &bucket).unwrap();

    let buckets: Vec<Vec<ProfileRecord>> = vec![load_json_or_empty(&bucket_path).unwrap()];
    let closed = closed_ids(&buckets);
    let again = ingest(rows(), load_store(&store_path).unwrap(), &closed);

    assert_eq!(again.closed, 1);
    assert_eq!(again.added, 0);
    assert_eq!(again.records.len(), 2);
    assert!(again.records.iter().all(|r| r.id != closed_id));
}

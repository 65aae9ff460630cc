// Directory rows → canonical store, preserving everything already harvested.

use std::collections::{HashMap, HashSet};

use profile_common::{DirectoryRow, ProfileRecord, SkipReason, SkipRecord};
use tracing::{info, warn};

use crate::identity::IdentityAssigner;
use crate::ledger::SkipLedger;

#[derive(Debug)]
pub struct IngestOutcome {
    pub records: Vec<ProfileRecord>,
    pub added: usize,
    pub refreshed: usize,
    /// Rows whose id is already closed in a bucket. They never re-enter the store.
    pub closed: usize,
    pub ledger: SkipLedger,
}

/// Assign ids to `rows` and fold them into `existing`. Known ids only refresh
/// their directory metadata; new ids are appended. Nothing is ever removed.
/// Ids in `closed` belong to bucketed profiles and are skipped.
pub fn ingest(
    rows: Vec<DirectoryRow>,
    existing: Vec<ProfileRecord>,
    closed: &HashSet<String>,
) -> IngestOutcome {
    let mut records = existing;
    let index: HashMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    let mut assigner = IdentityAssigner::new();
    let mut ledger = SkipLedger::new();
    let (mut added, mut refreshed, mut closed_rows) = (0, 0, 0);

    for (row_idx, row) in rows.into_iter().enumerate() {
        if row.name.trim().is_empty() {
            warn!(row = row_idx, "Directory row has no name, skipping");
            ledger.push(
                SkipRecord::new(None, row.profile_url.as_deref(), SkipReason::SchemaValidation)
                    .with_detail(format!("row {row_idx}: empty name")),
            );
            continue;
        }

        let id = assigner.assign(&row);
        if closed.contains(&id) {
            info!(id = id.as_str(), "Profile is closed in a bucket, not re-adding");
            closed_rows += 1;
            continue;
        }
        match index.get(&id) {
            Some(&i) => {
                let record = &mut records[i];
                record.last_updated = row.last_updated;
                record.location_flexibility = row.location_flexibility;
                refreshed += 1;
            }
            None => {
                records.push(ProfileRecord::from_row(id, row));
                added += 1;
            }
        }
    }

    info!(added, refreshed, closed = closed_rows, skipped = ledger.len(), total = records.len(), "Ingested directory");
    IngestOutcome {
        records,
        added,
        refreshed,
        closed: closed_rows,
        ledger,
    }
}

/// Every id held by the given bucket files.
pub fn closed_ids(buckets: &[Vec<ProfileRecord>]) -> HashSet<String> {
    buckets.iter().flatten().map(|r| r.id.clone()).collect()
}

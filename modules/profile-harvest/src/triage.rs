// Terminal ACTIVE → CLOSED move of a confirmed-unusable profile into a bucket file.

use std::path::Path;

use chrono::{DateTime, Utc};
use profile_common::{HarvestError, ProfileRecord, ReviewStatus};
use tracing::{info, warn};

use crate::store;

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Profile {0} not found in source")]
    NotFound(String),

    #[error("A non-empty reason is required to close a profile")]
    EmptyReason,

    #[error(transparent)]
    Store(#[from] HarvestError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub id: String,
    /// The bucket already held this id; the source copy was dropped, not appended.
    pub duplicate_in_bucket: bool,
    pub source_len: usize,
    pub bucket_len: usize,
}

/// Move one record from `source` to `bucket`, stamping the review fields.
pub fn move_to_bucket(
    id: &str,
    source: &mut Vec<ProfileRecord>,
    bucket: &mut Vec<ProfileRecord>,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<MoveOutcome, TriageError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(TriageError::EmptyReason);
    }
    let pos = source
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| TriageError::NotFound(id.to_string()))?;

    let mut record = source.remove(pos);
    record.review_status = Some(ReviewStatus::Closed);
    record.review_reason = Some(reason.to_string());
    record.review_timestamp = Some(now);

    let duplicate_in_bucket = bucket.iter().any(|r| r.id == id);
    if duplicate_in_bucket {
        warn!(id, "Bucket already contains this id, not appending a second copy");
    } else {
        bucket.push(record);
    }

    info!(
        id,
        reason,
        source_len = source.len(),
        bucket_len = bucket.len(),
        "Moved profile to bucket"
    );
    Ok(MoveOutcome {
        id: id.to_string(),
        duplicate_in_bucket,
        source_len: source.len(),
        bucket_len: bucket.len(),
    })
}

/// Move one record between store files. The updated source goes to `out`
/// (default: in place). With `dry_run` the outcome is computed and nothing is written.
pub fn move_in_files(
    id: &str,
    source: &Path,
    bucket: &Path,
    out: Option<&Path>,
    reason: &str,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<MoveOutcome, TriageError> {
    let mut active = store::load_store(source)?;
    let mut closed: Vec<ProfileRecord> = store::load_json_or_empty(bucket)?;
    let outcome = move_to_bucket(id, &mut active, &mut closed, reason, now)?;

    if dry_run {
        info!(id, "Dry run, no files written");
        return Ok(outcome);
    }
    // Bucket first, so an interrupted move leaves a duplicate rather than a lost record.
    store::write_json(bucket, &closed)?;
    store::write_json(out.unwrap_or(source), &active)?;
    Ok(outcome)
}

// JSON array files: canonical store, skip ledgers, buckets, secondary datasets.
// Whole-collection read at start, whole-collection atomic write at end.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use profile_common::{HarvestError, ProfileRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// Read a required JSON array. A missing file is fatal.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, HarvestError> {
    if !path.exists() {
        return Err(HarvestError::MissingInput(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| HarvestError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| HarvestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an optional JSON array. A missing file reads as empty.
pub fn load_json_or_empty<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, HarvestError> {
    if !path.exists() {
        warn!(path = %path.display(), "File not found, treating as empty");
        return Ok(Vec::new());
    }
    load_json(path)
}

/// Read the canonical store and enforce one record per id.
pub fn load_store(path: &Path) -> Result<Vec<ProfileRecord>, HarvestError> {
    let records: Vec<ProfileRecord> = load_json(path)?;
    ensure_unique_ids(&records, path)?;
    info!(path = %path.display(), records = records.len(), "Loaded store");
    Ok(records)
}

fn ensure_unique_ids(records: &[ProfileRecord], path: &Path) -> Result<(), HarvestError> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(HarvestError::Configuration(format!(
                "Duplicate id {} in {}",
                record.id,
                path.display()
            )));
        }
    }
    Ok(())
}

/// Pretty-print to a temp file beside `path`, then rename over it.
pub fn write_json<T: Serialize>(path: &Path, items: &[T]) -> Result<(), HarvestError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;

    let mut body = serde_json::to_vec_pretty(items)
        .map_err(|e| HarvestError::io(path, io::Error::other(e)))?;
    body.push(b'\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| HarvestError::io(dir, e))?;
    tmp.write_all(&body).map_err(|e| HarvestError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| HarvestError::io(path, e.error))?;

    info!(path = %path.display(), items = items.len(), "Wrote JSON");
    Ok(())
}

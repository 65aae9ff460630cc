// One sequential fetch pass over a set of records.
//
// Per row: extract (shortener expansion + platform strategy), optionally snapshot the
// raw body, then hand the text to the merge gate. Every per-row failure becomes one
// skip record; nothing crosses a row boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use profile_archive::{ExtractionError, ExtractorSet, FetchAttempt};
use profile_common::{ProfileRecord, SkipReason, SkipRecord};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::ledger::{PassSummary, SkipLedger};
use crate::merge::{self, Candidate};

#[derive(Debug, Clone, TypedBuilder)]
pub struct PassOptions {
    /// Fixed politeness delay between rows that made a request.
    #[builder(default = Duration::from_millis(1200))]
    pub delay: Duration,
    #[builder(default = 1)]
    pub min_gain: usize,
    /// Upper bound on one row, covering expansion, retries and rendering.
    #[builder(default = Duration::from_secs(180))]
    pub row_timeout: Duration,
    /// Directory for raw body snapshots.
    #[builder(default, setter(strip_option))]
    pub raw_dir: Option<PathBuf>,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
pub struct PassReport {
    pub summary: PassSummary,
    pub ledger: SkipLedger,
    /// The pass stopped early on cancellation. Rows after the last processed one are untouched.
    pub interrupted: bool,
}

enum RowOutcome {
    Improved,
    Unchanged,
    Skipped(SkipRecord),
}

pub struct FetchOrchestrator<'a> {
    extractors: &'a ExtractorSet,
    options: PassOptions,
    cancel: CancellationToken,
}

impl<'a> FetchOrchestrator<'a> {
    pub fn new(extractors: &'a ExtractorSet, options: PassOptions) -> Self {
        Self {
            extractors,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self, mut records: Vec<&mut ProfileRecord>) -> PassReport {
        let total = records.len();
        let mut summary = PassSummary {
            total,
            ..Default::default()
        };
        let mut ledger = SkipLedger::new();
        let mut interrupted = false;
        let mut pause_before_next = false;

        info!(total, "Starting fetch pass");

        for (idx, record) in records.iter_mut().enumerate() {
            if pause_before_next && !self.pause().await {
                interrupted = true;
                break;
            }
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            info!(id = record.id.as_str(), "({}/{}) fetching", idx + 1, total);
            pause_before_next = record.effective_url().is_some();

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                outcome = self.process(record) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                warn!(id = record.id.as_str(), "Pass cancelled mid-row, row left unchanged");
                interrupted = true;
                break;
            };

            summary.processed += 1;
            match outcome {
                RowOutcome::Improved => summary.improved += 1,
                RowOutcome::Unchanged => summary.unchanged += 1,
                RowOutcome::Skipped(skip) => {
                    let reason = skip.reason;
                    if ledger.push(skip) {
                        *summary.skipped.entry(reason).or_insert(0) += 1;
                    }
                }
            }
        }

        info!(%summary, interrupted, "Fetch pass finished");
        PassReport {
            summary,
            ledger,
            interrupted,
        }
    }

    /// Sleep the politeness delay. Returns false if cancelled while waiting.
    async fn pause(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.options.delay) => true,
        }
    }

    async fn process(&self, record: &mut ProfileRecord) -> RowOutcome {
        let id = record.id.clone();
        let Some(url) = record.effective_url().map(String::from) else {
            info!(id = id.as_str(), "Skipped: no profile URL");
            return RowOutcome::Skipped(SkipRecord::new(Some(&id), None, SkipReason::MissingUrl));
        };

        let fetched = tokio::time::timeout(
            self.options.row_timeout,
            self.extractors.fetch(Some(&url)),
        )
        .await
        .unwrap_or_else(|_| Err(ExtractionError::network(&url, "row timed out")));

        let attempt = match fetched {
            Ok(attempt) => attempt,
            Err(e) => {
                let reason = e.skip_reason();
                info!(id = id.as_str(), url = url.as_str(), %reason, error = %e, "Skipped");
                let mut skip =
                    SkipRecord::new(Some(&id), Some(&url), reason).with_detail(e.to_string());
                if let Some(status) = e.status() {
                    skip = skip.with_status(status);
                }
                return RowOutcome::Skipped(skip);
            }
        };

        if let Some(dir) = &self.options.raw_dir {
            if let Err(e) = write_raw_snapshot(dir, &id, &url, &attempt) {
                warn!(id = id.as_str(), error = %e, "Failed to write raw snapshot");
                return RowOutcome::Skipped(
                    SkipRecord::new(Some(&id), Some(&url), SkipReason::RawWriteError)
                        .with_detail(e.to_string()),
                );
            }
        }

        let strategy = attempt.strategy;
        let candidate = Candidate {
            text: attempt.text,
            expanded_url: attempt.expanded_url,
            platform: Some(attempt.platform),
            fetched_at: Utc::now(),
        };
        let decision = merge::apply(record, candidate, self.options.min_gain);
        if decision.accepted {
            info!(
                id = id.as_str(),
                strategy,
                old_words = decision.old_words,
                new_words = decision.new_words,
                "Improved"
            );
            RowOutcome::Improved
        } else {
            info!(
                id = id.as_str(),
                strategy,
                old_words = decision.old_words,
                new_words = decision.new_words,
                "Unchanged"
            );
            RowOutcome::Unchanged
        }
    }
}

/// `profile_<id>.html`, or a URL-hash name when the record has no id.
pub fn raw_snapshot_name(id: &str, url: &str) -> String {
    if id.trim().is_empty() {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        format!("profile_{}.html", &digest[..12])
    } else {
        format!("profile_{id}.html")
    }
}

/// Ids end up in file names under the raw directory; separators and `..` are refused.
fn is_safe_file_id(id: &str) -> bool {
    !id.contains(['/', '\\']) && !id.contains("..") && !id.contains('\0')
}

fn write_raw_snapshot(
    dir: &Path,
    id: &str,
    url: &str,
    attempt: &FetchAttempt,
) -> std::io::Result<()> {
    if !is_safe_file_id(id) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("id {id:?} is not usable in a file name"),
        ));
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(raw_snapshot_name(id, url)), &attempt.raw)
}

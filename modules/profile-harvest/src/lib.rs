pub mod filter;
pub mod identity;
pub mod ingest;
pub mod ledger;
pub mod merge;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod store;
pub mod style_join;
pub mod tagging;
pub mod triage;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use identity::IdentityAssigner;
pub use ledger::{PassSummary, SkipLedger};
pub use merge::{merge, Candidate, MergeDecision};
pub use orchestrator::{FetchOrchestrator, PassOptions, PassReport};
pub use policy::RescrapeHoldPolicy;
pub use triage::{move_to_bucket, MoveOutcome, TriageError};

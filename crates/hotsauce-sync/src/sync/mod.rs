//! Sync orchestration
//!
//! Provides:
//! - `SyncOrchestrator`: refresh flow from provider to cache to published state
//! - `SyncState`: the whole-value state read by the presentation layer
//! - A single in-flight refresh; overlapping calls return `AlreadyRunning`

mod orchestrator;
mod state;

pub use orchestrator::{RefreshOutcome, SyncOrchestrator, SyncStats};
pub use state::{SyncOutcome, SyncPhase, SyncState, NEVER_UPDATED};

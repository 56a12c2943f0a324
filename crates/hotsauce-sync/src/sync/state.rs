//! Observable sync state

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::DailyRecord;

/// Label shown before the first successful refresh
pub const NEVER_UPDATED: &str = "Never";

/// How the last finished refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Success,
    Failed,
}

/// Where the orchestrator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "outcome", rename_all = "snake_case")]
pub enum SyncPhase {
    /// Cache not loaded yet
    ColdStart,
    /// Ready; carries the outcome of the last refresh, if any
    Idle(Option<SyncOutcome>),
    /// A refresh is in flight
    Syncing,
}

/// Everything the presentation layer reads
///
/// Published as a whole value, so readers never see a half-applied update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub today_steps: u32,
    /// Newest first
    pub last_30_days: Vec<DailyRecord>,
    pub last_updated: Option<DateTime<Local>>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub authorized: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            phase: SyncPhase::ColdStart,
            today_steps: 0,
            last_30_days: Vec::new(),
            last_updated: None,
            is_loading: false,
            last_error: None,
            authorized: false,
        }
    }
}

impl SyncState {
    /// Idle state showing cached records
    pub fn from_cache(records: Vec<DailyRecord>) -> Self {
        Self {
            phase: SyncPhase::Idle(None),
            today_steps: records.first().map(DailyRecord::steps).unwrap_or(0),
            last_30_days: records,
            ..Self::default()
        }
    }

    /// Short local time of the last successful refresh, or "Never"
    pub fn last_updated_label(&self) -> String {
        match self.last_updated {
            Some(at) => at.format("%H:%M").to_string(),
            None => NEVER_UPDATED.to_string(),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.phase == SyncPhase::Syncing
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.phase = SyncPhase::Syncing;
        self.is_loading = true;
        self.last_error = None;
    }

    pub(crate) fn finish_success(
        &mut self,
        today_steps: u32,
        records: Vec<DailyRecord>,
        at: DateTime<Local>,
    ) {
        self.today_steps = today_steps;
        self.last_30_days = records;
        self.last_updated = Some(at);
        self.is_loading = false;
        self.phase = SyncPhase::Idle(Some(SyncOutcome::Success));
    }

    pub(crate) fn finish_failure(&mut self, error: String) {
        self.last_error = Some(error);
        self.is_loading = false;
        self.phase = SyncPhase::Idle(Some(SyncOutcome::Failed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn record(day: u32, steps: u32) -> DailyRecord {
        DailyRecord::new(NaiveDate::from_ymd_opt(2026, 10, day).unwrap(), steps, 0.0, 0.0, 0)
    }

    #[test]
    fn test_default_is_cold_start() {
        let state = SyncState::default();
        assert_eq!(state.phase, SyncPhase::ColdStart);
        assert_eq!(state.last_updated_label(), "Never");
        assert!(!state.is_loading);
    }

    #[test]
    fn test_from_cache_takes_newest_steps() {
        let state = SyncState::from_cache(vec![record(18, 10000), record(17, 8000)]);
        assert_eq!(state.today_steps, 10000);
        assert_eq!(state.phase, SyncPhase::Idle(None));

        let empty = SyncState::from_cache(Vec::new());
        assert_eq!(empty.today_steps, 0);
        assert!(empty.last_30_days.is_empty());
    }

    #[test]
    fn test_refresh_transitions() {
        let mut state = SyncState::from_cache(vec![record(17, 8000)]);
        state.last_error = Some("old".to_string());

        state.begin_refresh();
        assert!(state.is_syncing());
        assert!(state.is_loading);
        assert_eq!(state.last_error, None);

        state.finish_failure("boom".to_string());
        assert_eq!(state.phase, SyncPhase::Idle(Some(SyncOutcome::Failed)));
        assert_eq!(state.last_30_days, vec![record(17, 8000)]);
        assert!(!state.is_loading);

        let at = Local.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap();
        state.begin_refresh();
        state.finish_success(1200, vec![record(18, 1200)], at);
        assert_eq!(state.phase, SyncPhase::Idle(Some(SyncOutcome::Success)));
        assert_eq!(state.last_updated_label(), "14:05");
        assert_eq!(state.today_steps, 1200);
    }

    #[test]
    fn test_serializes_phase_with_outcome() {
        let state = SyncState::from_cache(Vec::new());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"]["phase"], "idle");
        assert!(json["phase"]["outcome"].is_null());
    }
}

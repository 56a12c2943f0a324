//! Data models for daily activity records
//!
//! These structures represent one calendar day's activity summary and the
//! provider quantity categories it is assembled from.

mod record;

pub use record::{DailyRecord, Metric};

//! Health data provider access
//!
//! This module provides:
//! - The `HealthProvider` capability: authorization and cumulative-sum queries
//! - `HealthSource`: today's steps and per-day records built from provider queries
//! - `QueryLimiter`: bounded concurrency for provider queries
//! - `SampleFileProvider`: a provider backed by an exported samples file

mod limiter;
mod sample_file;
mod source;

pub use limiter::QueryLimiter;
pub use sample_file::{QuantitySample, SampleFileProvider};
pub use source::HealthSource;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::error::{HotSauceError, Result};
use crate::models::Metric;

/// Closed-open time interval `[start, end)` for a provider query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl QueryWindow {
    /// Window covering one local calendar day
    pub fn for_day(date: NaiveDate) -> Result<Self> {
        let next = date
            .succ_opt()
            .ok_or_else(|| HotSauceError::config(format!("No day after {}", date)))?;

        Ok(Self {
            start: start_of_day(date)?,
            end: start_of_day(next)?,
        })
    }

    /// Window from local midnight of `now`'s day up to `now`
    pub fn today_until(now: DateTime<Local>) -> Result<Self> {
        Ok(Self {
            start: start_of_day(now.date_naive())?,
            end: now,
        })
    }

    /// Calendar day the window starts on
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Strict-start membership: `start <= instant < end`
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        instant >= self.start.with_timezone(&Utc) && instant < self.end.with_timezone(&Utc)
    }
}

/// Earliest local instant on `date`
///
/// Midnight can fall inside a DST gap, in which case the first hour that
/// exists locally starts the day.
fn start_of_day(date: NaiveDate) -> Result<DateTime<Local>> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();

    (0..4)
        .find_map(|hour| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .ok_or_else(|| HotSauceError::config(format!("Cannot resolve start of day for {}", date)))
}

/// Capability offered by a platform health store
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// Whether a health store exists on this device
    fn is_available(&self) -> bool;

    /// Request read access to the given metrics
    ///
    /// May show a consent prompt. Succeeds when access is granted now or was
    /// granted before.
    async fn request_authorization(&self, metrics: &[Metric]) -> Result<()>;

    /// Cumulative sum of `metric` over `window`, `None` when there is no data
    async fn cumulative_sum(&self, metric: Metric, window: QueryWindow) -> Result<Option<f64>>;
}

#[async_trait]
impl<P: HealthProvider + ?Sized> HealthProvider for Arc<P> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn request_authorization(&self, metrics: &[Metric]) -> Result<()> {
        (**self).request_authorization(metrics).await
    }

    async fn cumulative_sum(&self, metric: Metric, window: QueryWindow) -> Result<Option<f64>> {
        (**self).cumulative_sum(metric, window).await
    }
}

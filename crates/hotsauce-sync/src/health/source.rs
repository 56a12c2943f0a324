//! Health source adapter: today's steps and per-day records

use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveDate};
use futures_util::future::join_all;
use tracing::{debug, warn};

use super::{HealthProvider, QueryLimiter, QueryWindow};
use crate::error::{HotSauceError, Result};
use crate::models::{DailyRecord, Metric};

type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Builds daily records from a health provider
pub struct HealthSource<P> {
    provider: P,
    limiter: QueryLimiter,
    clock: Clock,
}

impl<P: HealthProvider> HealthSource<P> {
    /// Create a source reading from `provider`, bounded by `limiter`
    pub fn new(provider: P, limiter: QueryLimiter) -> Self {
        Self {
            provider,
            limiter,
            clock: Arc::new(Local::now),
        }
    }

    /// Replace the wall clock used to find "today"
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn limiter(&self) -> &QueryLimiter {
        &self.limiter
    }

    /// Current local time according to the source's clock
    pub fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    /// Request read access to steps, distance, active energy and exercise time
    pub async fn request_authorization(&self) -> Result<()> {
        self.ensure_available()?;
        self.provider.request_authorization(&Metric::ALL).await
    }

    /// Steps from local midnight until now
    pub async fn fetch_today(&self) -> Result<u32> {
        self.ensure_available()?;

        let window = QueryWindow::today_until(self.now())?;
        match self.query(Metric::Steps, window).await? {
            // float-to-int casts saturate, NaN becomes zero
            Some(steps) => Ok(steps as u32),
            None => Err(HotSauceError::NoDataAvailable),
        }
    }

    /// Records for the `days` calendar days ending today, newest first
    pub async fn fetch_range(&self, days: u32) -> Result<Vec<DailyRecord>> {
        self.ensure_available()?;
        let today = self.now().date_naive();
        Ok(self.fetch_days_ending(today, days).await)
    }

    /// Records for the `days` calendar days ending on `last_day`, newest first
    ///
    /// Days are fetched concurrently and independently. A day whose every
    /// metric query fails is skipped; a single failing or empty metric counts
    /// as zero.
    pub async fn fetch_days_ending(&self, last_day: NaiveDate, days: u32) -> Vec<DailyRecord> {
        let dates = (0..days).filter_map(|offset| last_day.checked_sub_days(Days::new(u64::from(offset))));

        let mut records: Vec<DailyRecord> = join_all(dates.map(|date| self.fetch_day(date)))
            .await
            .into_iter()
            .flatten()
            .collect();

        records.sort_by(|a, b| b.date().cmp(&a.date()));
        debug!(requested = days, fetched = records.len(), "Fetched daily records");
        records
    }

    async fn fetch_day(&self, date: NaiveDate) -> Option<DailyRecord> {
        let window = match QueryWindow::for_day(date) {
            Ok(window) => window,
            Err(e) => {
                warn!(%date, error = %e, "Skipping day");
                return None;
            }
        };

        let (steps, distance, energy, exercise) = tokio::join!(
            self.query(Metric::Steps, window),
            self.query(Metric::Distance, window),
            self.query(Metric::ActiveEnergy, window),
            self.query(Metric::ExerciseTime, window),
        );

        if steps.is_err() && distance.is_err() && energy.is_err() && exercise.is_err() {
            warn!(%date, "Skipping day: every metric query failed");
            return None;
        }

        Some(DailyRecord::from_sums(
            date,
            sum_or_zero(date, Metric::Steps, steps),
            sum_or_zero(date, Metric::Distance, distance),
            sum_or_zero(date, Metric::ActiveEnergy, energy),
            sum_or_zero(date, Metric::ExerciseTime, exercise),
        ))
    }

    async fn query(&self, metric: Metric, window: QueryWindow) -> Result<Option<f64>> {
        debug!(%metric, unit = metric.unit(), start = %window.start, end = %window.end, "Provider query");
        self.limiter
            .run(metric, self.provider.cumulative_sum(metric, window))
            .await
    }

    fn ensure_available(&self) -> Result<()> {
        if self.provider.is_available() {
            Ok(())
        } else {
            Err(HotSauceError::PlatformUnavailable)
        }
    }
}

fn sum_or_zero(date: NaiveDate, metric: Metric, result: Result<Option<f64>>) -> f64 {
    match result {
        Ok(sum) => sum.unwrap_or(0.0),
        Err(e) => {
            warn!(%date, %metric, error = %e, "Metric query failed, using zero");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Provider returning fixed sums, with failures injected per day and metric
    struct FakeProvider {
        available: bool,
        failing: HashSet<(NaiveDate, Metric)>,
        empty: HashSet<(NaiveDate, Metric)>,
        queries: Mutex<Vec<(Metric, NaiveDate)>>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                available: true,
                failing: HashSet::new(),
                empty: HashSet::new(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn fail(mut self, date: NaiveDate, metric: Metric) -> Self {
            self.failing.insert((date, metric));
            self
        }

        fn fail_day(mut self, date: NaiveDate) -> Self {
            for metric in Metric::ALL {
                self.failing.insert((date, metric));
            }
            self
        }

        fn empty(mut self, date: NaiveDate, metric: Metric) -> Self {
            self.empty.insert((date, metric));
            self
        }
    }

    #[async_trait]
    impl HealthProvider for FakeProvider {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn request_authorization(&self, _metrics: &[Metric]) -> Result<()> {
            Ok(())
        }

        async fn cumulative_sum(&self, metric: Metric, window: QueryWindow) -> Result<Option<f64>> {
            let date = window.date();
            self.queries.lock().unwrap().push((metric, date));

            if self.failing.contains(&(date, metric)) {
                return Err(HotSauceError::query(metric, "injected failure"));
            }
            if self.empty.contains(&(date, metric)) {
                return Ok(None);
            }
            Ok(Some(match metric {
                Metric::Steps => 5000.0,
                Metric::Distance => 4000.0,
                Metric::ActiveEnergy => 250.0,
                Metric::ExerciseTime => 30.0,
            }))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn noon(date: NaiveDate) -> DateTime<Local> {
        Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
    }

    fn source(provider: FakeProvider) -> HealthSource<FakeProvider> {
        HealthSource::new(provider, QueryLimiter::new(8)).with_clock(|| noon(today()))
    }

    #[tokio::test]
    async fn test_fetch_range_returns_thirty_days_newest_first() {
        let source = source(FakeProvider::new());

        let records = source.fetch_range(30).await.unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(records[0].date(), today());
        assert_eq!(records[29].date(), today() - Days::new(29));
        assert!(records.windows(2).all(|w| w[0].date() > w[1].date()));
        assert_eq!(source.provider().queries.lock().unwrap().len(), 120);
    }

    #[tokio::test]
    async fn test_day_with_all_metrics_failing_is_skipped() {
        let day15 = today() - Days::new(14);
        let source = source(FakeProvider::new().fail_day(day15));

        let records = source.fetch_range(30).await.unwrap();

        assert_eq!(records.len(), 29);
        assert!(records.iter().all(|r| r.date() != day15));
        assert!(records.iter().all(|r| r.steps() == 5000));
    }

    #[tokio::test]
    async fn test_failed_metric_falls_back_to_zero() {
        let day = today() - Days::new(3);
        let source = source(FakeProvider::new().fail(day, Metric::Distance));

        let records = source.fetch_range(30).await.unwrap();
        let record = records.iter().find(|r| r.date() == day).unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(record.steps(), 5000);
        assert_eq!(record.distance(), 0.0);
        assert_eq!(record.calories(), 250.0);
        assert_eq!(record.active_minutes(), 30);
    }

    #[tokio::test]
    async fn test_missing_metric_contributes_zero() {
        let day = today() - Days::new(1);
        let source = source(FakeProvider::new().empty(day, Metric::ExerciseTime));

        let records = source.fetch_range(2).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date(), day);
        assert_eq!(records[1].active_minutes(), 0);
        assert_eq!(records[1].steps(), 5000);
    }

    #[tokio::test]
    async fn test_fetch_today() {
        let source = source(FakeProvider::new());
        assert_eq!(source.fetch_today().await.unwrap(), 5000);

        let queries = source.provider().queries.lock().unwrap().clone();
        assert_eq!(queries, vec![(Metric::Steps, today())]);
    }

    #[tokio::test]
    async fn test_fetch_today_without_data() {
        let source = source(FakeProvider::new().empty(today(), Metric::Steps));
        let err = source.fetch_today().await.unwrap_err();
        assert!(matches!(err, HotSauceError::NoDataAvailable));
    }

    #[tokio::test]
    async fn test_fetch_today_query_error() {
        let source = source(FakeProvider::new().fail(today(), Metric::Steps));
        let err = source.fetch_today().await.unwrap_err();
        assert!(matches!(err, HotSauceError::Query { metric: Metric::Steps, .. }));
    }

    #[tokio::test]
    async fn test_unavailable_platform() {
        let mut provider = FakeProvider::new();
        provider.available = false;
        let source = source(provider);

        assert!(matches!(
            source.request_authorization().await,
            Err(HotSauceError::PlatformUnavailable)
        ));
        assert!(matches!(
            source.fetch_today().await,
            Err(HotSauceError::PlatformUnavailable)
        ));
        assert!(matches!(
            source.fetch_range(30).await,
            Err(HotSauceError::PlatformUnavailable)
        ));
        assert!(source.provider().queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_days_is_empty() {
        let source = source(FakeProvider::new());
        assert!(source.fetch_range(0).await.unwrap().is_empty());
    }
}

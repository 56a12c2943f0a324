//! Semaphore-based concurrency control for provider queries

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{HotSauceError, Result};
use crate::models::Metric;

/// Thread-safe limiter shared by every query of a sync
#[derive(Clone)]
pub struct QueryLimiter {
    /// Semaphore limits concurrent provider queries
    semaphore: Arc<Semaphore>,
    /// Per-query deadline, none means wait forever
    timeout: Option<Duration>,
    /// Queries issued since the last reset
    issued: Arc<AtomicU32>,
    /// Queries that returned an error or timed out
    failed: Arc<AtomicU32>,
}

impl Default for QueryLimiter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CONCURRENT_QUERIES)
    }
}

impl QueryLimiter {
    /// Create a limiter allowing `max_concurrent` in-flight queries
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.clamp(1, Semaphore::MAX_PERMITS))),
            timeout: None,
            issued: Arc::new(AtomicU32::new(0)),
            failed: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail queries that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one provider query under a permit
    pub async fn run<T, F>(&self, metric: Metric, query: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| HotSauceError::query(metric, "query limiter closed"))?;

        self.issued.fetch_add(1, Ordering::Relaxed);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, query).await {
                Ok(result) => result,
                Err(_) => Err(HotSauceError::query(
                    metric,
                    format!("timed out after {}s", limit.as_secs_f64()),
                )),
            },
            None => query.await,
        };

        if result.is_err() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Reset counters at the start of a sync
    pub fn reset_counters(&self) {
        self.issued.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}

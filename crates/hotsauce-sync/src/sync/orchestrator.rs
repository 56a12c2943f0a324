//! Refresh orchestration: provider to cache to published state

use std::fmt;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::state::{SyncPhase, SyncState};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::health::{HealthProvider, HealthSource, QueryLimiter};
use crate::models::DailyRecord;
use crate::storage::LocalCache;

/// Counters for one successful refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Daily records published
    pub days: u32,
    /// Provider queries issued
    pub queries: u32,
    /// Provider queries that failed and counted as zero
    pub failed_queries: u32,
    /// Whether the new snapshot reached the cache
    pub cached: bool,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Days: {}, Queries: {}, Failed: {}",
            self.days, self.queries, self.failed_queries
        )?;
        if !self.cached {
            write!(f, " (cache not updated)")?;
        }
        Ok(())
    }
}

/// What a call to `refresh` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh data was published
    Updated(SyncStats),
    /// The refresh failed; the message is also in `last_error`
    Failed(String),
    /// Another refresh was in flight, nothing was started
    AlreadyRunning,
}

/// Coordinates the health source, the cache and the published state
pub struct SyncOrchestrator<P> {
    source: HealthSource<P>,
    cache: LocalCache,
    history_days: u32,
    state: watch::Sender<SyncState>,
    refresh_guard: Mutex<()>,
}

impl<P: HealthProvider> SyncOrchestrator<P> {
    /// Create an orchestrator showing whatever the cache already holds
    pub fn new(source: HealthSource<P>, cache: LocalCache, history_days: u32) -> Self {
        let (state, _) = watch::channel(SyncState::default());

        let cached = cache.fetch_all();
        debug!(records = cached.len(), "Loaded cached records");
        state.send_replace(SyncState::from_cache(cached));

        Self {
            source,
            cache,
            history_days,
            state,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Create an orchestrator with limits and history length from `config`
    pub fn from_config(provider: P, cache: LocalCache, config: &SyncConfig) -> Self {
        let limiter =
            QueryLimiter::new(config.max_concurrent_queries).with_timeout(config.query_timeout);
        Self::new(HealthSource::new(provider, limiter), cache, config.history_days)
    }

    pub fn source(&self) -> &HealthSource<P> {
        &self.source
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn history_days(&self) -> u32 {
        self.history_days
    }

    /// Current state, copied out
    pub fn snapshot(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Clear the error shown to the user
    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }

    /// Ask the provider for read access and record the answer
    pub async fn request_authorization(&self) -> Result<()> {
        match self.source.request_authorization().await {
            Ok(()) => {
                self.state.send_modify(|state| state.authorized = true);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Authorization failed");
                let message = e.to_string();
                self.state.send_modify(|state| {
                    state.authorized = false;
                    state.last_error = Some(message);
                });
                Err(e)
            }
        }
    }

    /// Fetch today's steps and the history window, cache them, publish them
    ///
    /// Returns `AlreadyRunning` without touching the provider when another
    /// refresh holds the in-flight guard.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_running) = self.refresh_guard.try_lock() else {
            debug!("Refresh already in flight");
            return RefreshOutcome::AlreadyRunning;
        };

        let previous = self.state.borrow().phase;
        self.state.send_modify(SyncState::begin_refresh);
        let loading = LoadingGuard::new(&self.state, previous);

        self.source.limiter().reset_counters();
        let result = self.fetch().await;
        loading.disarm();

        match result {
            Ok((today_steps, records)) => self.publish(today_steps, records),
            Err(e) => {
                warn!(error = %e, "Refresh failed");
                let message = e.to_string();
                let lost_access = e.is_authorization();
                self.state.send_modify(|state| {
                    if lost_access {
                        state.authorized = false;
                    }
                    state.finish_failure(message.clone());
                });
                RefreshOutcome::Failed(message)
            }
        }
    }

    async fn fetch(&self) -> Result<(u32, Vec<DailyRecord>)> {
        // Copy the flag out; the borrow must not live across an await
        let authorized = self.state.borrow().authorized;
        if !authorized {
            self.source.request_authorization().await?;
            self.state.send_modify(|state| state.authorized = true);
        }

        let today_steps = self.source.fetch_today().await?;
        let records = self.source.fetch_range(self.history_days).await?;
        Ok((today_steps, records))
    }

    fn publish(&self, today_steps: u32, records: Vec<DailyRecord>) -> RefreshOutcome {
        // A failed write keeps the previous snapshot on disk; the fresh data is
        // still shown
        let cached = self.cache.replace_all(&records).is_ok();

        let stats = SyncStats {
            days: u32::try_from(records.len()).unwrap_or(u32::MAX),
            queries: self.source.limiter().issued(),
            failed_queries: self.source.limiter().failed(),
            cached,
        };
        let now = self.source.now();
        self.state
            .send_modify(|state| state.finish_success(today_steps, records, now));

        info!(%stats, "Refresh complete");
        RefreshOutcome::Updated(stats)
    }
}

/// Clears `is_loading` if a refresh future is dropped before it finishes
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SyncState>,
    previous: SyncPhase,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<SyncState>, previous: SyncPhase) -> Self {
        Self {
            state,
            previous,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let previous = self.previous;
            self.state.send_modify(|state| {
                state.is_loading = false;
                state.phase = previous;
            });
        }
    }
}

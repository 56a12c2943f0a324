use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HotSauceError, Result};
use crate::storage;

/// Days of history fetched on every refresh
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Provider queries allowed in flight at once
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 16;

const MAX_HISTORY_DAYS: u32 = 366;

/// Upper bound accepted for `max_concurrent_queries`
pub const MAX_CONCURRENT_QUERIES: usize = 1024;

pub const ENV_HISTORY_DAYS: &str = "HOTSAUCE_HISTORY_DAYS";
pub const ENV_MAX_CONCURRENT_QUERIES: &str = "HOTSAUCE_MAX_CONCURRENT_QUERIES";
pub const ENV_QUERY_TIMEOUT_SECS: &str = "HOTSAUCE_QUERY_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "HOTSAUCE_DATA_DIR";

/// Settings for one sync process
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Calendar days fetched per refresh, ending today
    pub history_days: u32,
    /// Upper bound on concurrent provider queries
    pub max_concurrent_queries: usize,
    /// Per-query deadline; none waits indefinitely
    pub query_timeout: Option<Duration>,
    /// Directory holding the cache database
    pub data_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            history_days: DEFAULT_HISTORY_DAYS,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            query_timeout: None,
            data_dir: storage::default_storage_path(),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `HOTSAUCE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(days) = lookup(ENV_HISTORY_DAYS) {
            config.history_days = parse_number(ENV_HISTORY_DAYS, &days)?;
        }
        if let Some(max) = lookup(ENV_MAX_CONCURRENT_QUERIES) {
            config.max_concurrent_queries = parse_number(ENV_MAX_CONCURRENT_QUERIES, &max)?;
        }
        if let Some(secs) = lookup(ENV_QUERY_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_QUERY_TIMEOUT_SECS, &secs)?;
            config.query_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.history_days == 0 || self.history_days > MAX_HISTORY_DAYS {
            return Err(HotSauceError::config(format!(
                "history days must be between 1 and {}, got {}",
                MAX_HISTORY_DAYS, self.history_days
            )));
        }
        if self.max_concurrent_queries == 0 || self.max_concurrent_queries > MAX_CONCURRENT_QUERIES {
            return Err(HotSauceError::config(format!(
                "max concurrent queries must be between 1 and {}, got {}",
                MAX_CONCURRENT_QUERIES, self.max_concurrent_queries
            )));
        }
        Ok(())
    }

    /// Path of the SQLite cache inside the data directory
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("cache.db")
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HotSauceError::config(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.history_days, 30);
        assert_eq!(config.max_concurrent_queries, 16);
        assert_eq!(config.query_timeout, None);
        assert!(config.cache_path().ends_with("hotsauce/cache.db"));
    }

    #[test]
    fn test_env_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            (ENV_HISTORY_DAYS, "7"),
            (ENV_MAX_CONCURRENT_QUERIES, " 4 "),
            (ENV_QUERY_TIMEOUT_SECS, "20"),
            (ENV_DATA_DIR, "/tmp/hs"),
        ]))
        .unwrap();

        assert_eq!(config.history_days, 7);
        assert_eq!(config.max_concurrent_queries, 4);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(20)));
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/hs/cache.db"));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = SyncConfig::from_lookup(lookup(&[(ENV_QUERY_TIMEOUT_SECS, "0")])).unwrap();
        assert_eq!(config.query_timeout, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = SyncConfig::from_lookup(lookup(&[(ENV_HISTORY_DAYS, "thirty")])).unwrap_err();
        assert!(err.to_string().contains(ENV_HISTORY_DAYS));

        assert!(SyncConfig::from_lookup(lookup(&[(ENV_HISTORY_DAYS, "0")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_HISTORY_DAYS, "400")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_QUERIES, "0")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_QUERIES, "1025")])).is_err());

        let huge = usize::MAX.to_string();
        let err = SyncConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_QUERIES, huge.as_str())])).unwrap_err();
        assert!(matches!(err, HotSauceError::Config(_)));
    }

    #[test]
    fn test_concurrency_cap_is_accepted() {
        let config =
            SyncConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_QUERIES, "1024")])).unwrap();
        assert_eq!(config.max_concurrent_queries, MAX_CONCURRENT_QUERIES);
    }
}

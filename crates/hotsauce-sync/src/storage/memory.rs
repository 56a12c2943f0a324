//! Process-local record cache

use std::sync::RwLock;

use super::CacheBackend;
use crate::error::{HotSauceError, Result};
use crate::models::DailyRecord;

/// Snapshot held in memory, swapped whole on every replace
#[derive(Default)]
pub struct MemoryCache {
    records: RwLock<Vec<DailyRecord>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCache {
    fn replace_all(&self, records: &[DailyRecord]) -> Result<()> {
        let mut snapshot = records.to_vec();
        snapshot.sort_by(|a, b| b.date().cmp(&a.date()));

        let mut guard = self
            .records
            .write()
            .map_err(|_| HotSauceError::database("memory cache poisoned"))?;
        *guard = snapshot;
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<DailyRecord>> {
        self.records
            .read()
            .map(|records| records.clone())
            .map_err(|_| HotSauceError::database("memory cache poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_swap_sorts_newest_first() {
        let cache = MemoryCache::new();
        let old = DailyRecord::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 1, 0.0, 0.0, 0);
        let new = DailyRecord::new(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), 2, 0.0, 0.0, 0);

        cache.replace_all(&[old.clone(), new.clone()]).unwrap();
        assert_eq!(cache.fetch_all().unwrap(), vec![new, old]);
    }
}

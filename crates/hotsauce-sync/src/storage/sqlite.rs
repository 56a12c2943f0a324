//! SQLite-backed record cache
//!
//! A single `daily_records` table keyed by calendar date. Replacing the
//! snapshot deletes and inserts inside one transaction, so a failed or
//! interrupted write rolls back to the previous snapshot.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::CacheBackend;
use crate::error::{HotSauceError, Result};
use crate::models::DailyRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database holding the cached snapshot
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create the cache database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| HotSauceError::Database(format!("Failed to open cache database: {}", e)))?;

        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.migrate()?;
        Ok(cache)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HotSauceError::Database(format!("Failed to open in-memory database: {}", e)))?;

        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.migrate()?;
        Ok(cache)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HotSauceError::database("cache connection poisoned"))
    }

    /// Run migrations
    fn migrate(&self) -> Result<()> {
        self.connection()?
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS daily_records (
                    date TEXT PRIMARY KEY NOT NULL,
                    steps INTEGER NOT NULL CHECK (steps >= 0),
                    distance_m REAL NOT NULL CHECK (distance_m >= 0),
                    calories_kcal REAL NOT NULL CHECK (calories_kcal >= 0),
                    active_minutes INTEGER NOT NULL CHECK (active_minutes >= 0)
                );
                "#,
            )
            .map_err(|e| HotSauceError::Database(format!("Failed to run migrations: {}", e)))?;

        Ok(())
    }

    /// Number of cached records
    #[cfg(test)]
    fn count(&self) -> Result<u32> {
        self.connection()?
            .query_row("SELECT COUNT(*) FROM daily_records", [], |row| row.get(0))
            .map_err(|e| HotSauceError::Database(format!("Failed to count records: {}", e)))
    }
}

impl CacheBackend for SqliteCache {
    fn replace_all(&self, records: &[DailyRecord]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| HotSauceError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM daily_records", [])
            .map_err(|e| HotSauceError::Database(format!("Failed to clear records: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO daily_records
                         (date, steps, distance_m, calories_kcal, active_minutes)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .map_err(|e| HotSauceError::Database(format!("Failed to prepare insert: {}", e)))?;

            for record in records {
                stmt.execute(params![
                    record.date().format(DATE_FORMAT).to_string(),
                    record.steps(),
                    record.distance(),
                    record.calories(),
                    record.active_minutes(),
                ])
                .map_err(|e| {
                    HotSauceError::Database(format!("Failed to insert record {}: {}", record.date(), e))
                })?;
            }
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()
            .map_err(|e| HotSauceError::Database(format!("Failed to commit records: {}", e)))?;

        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<DailyRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, steps, distance_m, calories_kcal, active_minutes
                 FROM daily_records
                 ORDER BY date DESC",
            )
            .map_err(|e| HotSauceError::Database(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            })
            .map_err(|e| HotSauceError::Database(format!("Failed to query records: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            let (date, steps, distance, calories, active_minutes) =
                row.map_err(|e| HotSauceError::Database(e.to_string()))?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map_err(|_| HotSauceError::InvalidDateFormat(date.clone()))?;
            records.push(DailyRecord::new(date, steps, distance, calories, active_minutes));
        }

        Ok(records)
    }
}

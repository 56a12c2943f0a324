//! Health provider backed by an exported samples file
//!
//! The export is a JSON array of quantity samples:
//!
//! ```json
//! [
//!   { "metric": "steps", "start": "2026-10-18T08:00:00+02:00",
//!     "end": "2026-10-18T08:30:00+02:00", "value": 2400 }
//! ]
//! ```
//!
//! Sums use strict-start semantics: a sample belongs to a window when its
//! start lies in `[window.start, window.end)`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{HealthProvider, QueryWindow};
use crate::error::{HotSauceError, Result};
use crate::models::Metric;

/// One measured quantity over a time span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySample {
    pub metric: Metric,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: f64,
}

/// Reads quantity samples from a JSON export on disk
pub struct SampleFileProvider {
    path: PathBuf,
    samples: RwLock<Option<Arc<Vec<QuantitySample>>>>,
}

impl SampleFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            samples: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write samples as an export file
    pub fn write_export(path: impl AsRef<Path>, samples: &[QuantitySample]) -> Result<()> {
        let json = serde_json::to_string_pretty(samples)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Samples from the export, loaded once
    async fn samples(&self) -> Result<Arc<Vec<QuantitySample>>> {
        if let Some(samples) = self.samples.read().await.as_ref() {
            return Ok(Arc::clone(samples));
        }

        let mut cached = self.samples.write().await;
        if let Some(samples) = cached.as_ref() {
            return Ok(Arc::clone(samples));
        }

        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => HotSauceError::PlatformUnavailable,
            ErrorKind::PermissionDenied => HotSauceError::AuthorizationDenied,
            _ => HotSauceError::authorization(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            )),
        })?;
        let samples: Vec<QuantitySample> = serde_json::from_str(&json).map_err(|e| {
            HotSauceError::authorization(format!("Invalid export {}: {}", self.path.display(), e))
        })?;

        info!(path = %self.path.display(), samples = samples.len(), "Loaded health export");
        let samples = Arc::new(samples);
        *cached = Some(Arc::clone(&samples));
        Ok(samples)
    }
}

#[async_trait]
impl HealthProvider for SampleFileProvider {
    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    async fn request_authorization(&self, metrics: &[Metric]) -> Result<()> {
        let samples = self.samples().await?;
        debug!(?metrics, samples = samples.len(), "Authorized export access");
        Ok(())
    }

    async fn cumulative_sum(&self, metric: Metric, window: QueryWindow) -> Result<Option<f64>> {
        let samples = self
            .samples()
            .await
            .map_err(|e| HotSauceError::query(metric, e.to_string()))?;

        let mut matched = samples
            .iter()
            .filter(|s| s.metric == metric && window.contains(&s.start))
            .peekable();

        if matched.peek().is_none() {
            return Ok(None);
        }
        Ok(Some(matched.map(|s| s.value).sum()))
    }
}

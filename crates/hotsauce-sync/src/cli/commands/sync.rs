use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::SyncConfig;
use crate::health::SampleFileProvider;
use crate::storage::LocalCache;
use crate::sync::{RefreshOutcome, SyncOrchestrator};
use crate::{HotSauceError, Result};

use super::records::print_records;

/// Run one refresh against a samples export and print the result
pub async fn run(
    config: &SyncConfig,
    samples: PathBuf,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(days) = days {
        config.history_days = days;
        config.validate()?;
    }

    let cache = LocalCache::open(config.cache_path())?;
    let provider = SampleFileProvider::new(samples);
    let sync = SyncOrchestrator::from_config(provider, cache, &config);

    // Surface access problems with their own hint before syncing
    sync.request_authorization().await?;

    let stats = match sync.refresh().await {
        RefreshOutcome::Updated(stats) => stats,
        RefreshOutcome::Failed(message) => return Err(HotSauceError::Sync(message)),
        RefreshOutcome::AlreadyRunning => {
            println!("A sync is already running.");
            return Ok(());
        }
    };

    let state = sync.snapshot();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Table => {
            println!("Cache: {}", config.cache_path().display());
            println!("Today: {} steps", state.today_steps);
            println!("Updated: {}", state.last_updated_label());
            println!("{}", stats);
            println!();
            print_records(&state.last_30_days);
        }
    }

    Ok(())
}

//! Commands that read or reset the local cache without contacting the provider

use chrono::Local;

use crate::cli::OutputFormat;
use crate::config::SyncConfig;
use crate::models::DailyRecord;
use crate::storage::LocalCache;
use crate::Result;

/// Print the cached snapshot, newest first
pub async fn show(config: &SyncConfig, days: Option<u32>, format: OutputFormat) -> Result<()> {
    let Some(cache) = open_existing(config)? else {
        return Ok(());
    };

    let mut records = cache.fetch_all();
    if let Some(days) = days {
        records.truncate(days as usize);
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No cached records.");
            } else {
                print_records(&records);
            }
        }
    }

    Ok(())
}

/// Print today's steps from the cache
pub async fn today(config: &SyncConfig, format: OutputFormat) -> Result<()> {
    let Some(cache) = open_existing(config)? else {
        return Ok(());
    };

    let today = Local::now().date_naive();
    let steps = cache
        .fetch_all()
        .first()
        .filter(|r| r.date() == today)
        .map(DailyRecord::steps)
        .unwrap_or(0);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "date": today, "steps": steps })
        ),
        OutputFormat::Table => println!("Today: {} steps", steps),
    }

    Ok(())
}

/// Replace the cache with an empty snapshot
pub async fn clear(config: &SyncConfig) -> Result<()> {
    let Some(cache) = open_existing(config)? else {
        return Ok(());
    };

    let count = cache.fetch_all().len();
    cache.replace_all(&[])?;
    println!("Cleared {} cached records.", count);

    Ok(())
}

fn open_existing(config: &SyncConfig) -> Result<Option<LocalCache>> {
    let path = config.cache_path();
    if !path.exists() {
        println!("No cache found at: {}", path.display());
        println!("Run 'hotsauce sync --samples <FILE>' to create one.");
        return Ok(None);
    }
    LocalCache::open(&path).map(Some)
}

/// Records as an aligned table with an average row
pub(crate) fn print_records(records: &[DailyRecord]) {
    println!(
        "{:<14} {:>8} {:>10} {:>10} {:>8}",
        "Date", "Steps", "Distance", "Calories", "Active"
    );
    println!("{}", "-".repeat(54));

    for record in records {
        println!(
            "{:<14} {:>8} {:>10} {:>10} {:>4} min",
            record.formatted_date(),
            record.steps(),
            record.formatted_distance(),
            record.formatted_calories(),
            record.active_minutes()
        );
    }

    if !records.is_empty() {
        let count = records.len() as u64;
        let total_steps: u64 = records.iter().map(|r| u64::from(r.steps())).sum();
        let total_minutes: u64 = records.iter().map(|r| u64::from(r.active_minutes())).sum();
        println!("{}", "-".repeat(54));
        println!(
            "{:<14} {:>8} {:>10} {:>10} {:>4} min",
            "Average",
            total_steps / count,
            "",
            "",
            total_minutes / count
        );
    }
}

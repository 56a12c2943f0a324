use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotsauce_sync::cli::{commands, OutputFormat};
use hotsauce_sync::config::SyncConfig;
use hotsauce_sync::logging::{self, LogFormat};

#[derive(Parser)]
#[command(name = "hotsauce")]
#[command(author, version, about = "Daily activity sync into a local cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Directory holding the cache database
    #[arg(long, global = true, env = "HOTSAUCE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true, env = "HOTSAUCE_LOG", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch today and the history window, then update the cache
    Sync {
        /// Health export file (JSON quantity samples)
        #[arg(long, env = "HOTSAUCE_SAMPLES")]
        samples: PathBuf,
        /// Days of history to fetch (default: 30)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show cached daily records
    Show {
        /// Number of days to show
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show today's cached step count
    Today,
    /// Remove every cached record
    Clear,
}

#[tokio::main]
async fn main() -> hotsauce_sync::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.log_format) {
        eprintln!("Warning: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", hotsauce_sync::error::format_user_error(&e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> hotsauce_sync::Result<()> {
    let mut config = SyncConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Sync { samples, days } => {
            commands::sync_run(&config, samples, days, cli.format).await
        }
        Commands::Show { days } => commands::show(&config, days, cli.format).await,
        Commands::Today => commands::today(&config, cli.format).await,
        Commands::Clear => commands::clear(&config).await,
    }
}

//! Structured logging setup

use std::io;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{HotSauceError, Result};

/// Log output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Build the event filter: `RUST_LOG` when set, otherwise `level` for this crate
pub fn filter(level: &str) -> EnvFilter {
    std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(format!("warn,hotsauce_sync={}", level)),
        EnvFilter::new,
    )
}

/// Formatting layer for `format`, writing through `writer`
pub fn layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global tracing subscriber
///
/// Events go to stderr so command output on stdout stays parseable.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(layer(format, io::stderr))
        .try_init()
        .map_err(|e| HotSauceError::config(format!("Failed to initialize logging: {}", e)))
}

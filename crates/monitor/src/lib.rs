//! NoNap Monitor
//!
//! Replays recorded facial ratio signals through the alertness monitor and
//! executes the resulting alert commands.

pub mod replay;
pub mod settings;

pub use replay::{run_replay, ReplayError, ReplaySummary, SignalRecord};
pub use settings::{LoggingSettings, MonitorSettings};

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging to stderr (stdout carries results)
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let level: Level = settings
        .level
        .parse()
        .with_context(|| format!("invalid log level {:?}", settings.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("failed to set tracing subscriber")
}

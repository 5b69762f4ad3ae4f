//! NoNap Monitor - Main Entry Point
//!
//! Usage: `nonap-monitor [--config <file>] [<signals.jsonl>]`, reading stdin
//! when no signal file is given.

use alerting::{EffectExecutor, LogNotifier, LogToneDevice};
use alertness::AlertnessMonitor;
use anyhow::{bail, Context};
use monitor::{init_logging, run_replay, MonitorSettings};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        input: None,
    };
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("unknown option {flag}"),
            path => {
                if args.input.is_some() {
                    bail!("only one signal file may be given");
                }
                args.input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let settings = MonitorSettings::load(args.config.as_deref()).context("failed to load settings")?;
    init_logging(&settings.logging)?;

    info!("=== NoNap Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let mut monitor = AlertnessMonitor::new(settings.alertness)?;
    let executor = EffectExecutor::spawn(settings.executor, LogToneDevice::default(), LogNotifier);
    let handle = executor.handle();

    let input: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = tokio::task::spawn_blocking(move || {
        run_replay(input, io::stdout().lock(), &mut monitor, &handle)
    })
    .await??;

    let report = executor.shutdown().await?;
    info!(
        "Processed {} frames ({} skipped); alarm started {} time(s), {} notification(s) sent",
        summary.frames, summary.skipped, report.tone_starts, report.notifications_sent
    );

    Ok(())
}

//! JSON-lines signal replay

use alerting::ExecutorHandle;
use alertness::{AlertnessMonitor, FaceId, FrameResult, FrameSignal, RatioSample};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Replay input errors
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Line {line}: malformed record: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: ratios must be all present or all absent")]
    IncompleteRatios { line: usize },
}

/// One line of replay input
///
/// All three ratios present is a measured frame; all absent means the face
/// was not found in that frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    #[serde(default)]
    pub face: u32,
    pub t_ms: u64,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub right: Option<f64>,
    #[serde(default)]
    pub mouth: Option<f64>,
}

impl SignalRecord {
    pub fn parse(text: &str, line: usize) -> Result<Self, ReplayError> {
        serde_json::from_str(text).map_err(|source| ReplayError::Malformed { line, source })
    }

    pub fn to_signal(&self, line: usize) -> Result<(FaceId, FrameSignal), ReplayError> {
        let timestamp_ns = self.t_ms.saturating_mul(1_000_000);
        let signal = match (self.left, self.right, self.mouth) {
            (Some(left), Some(right), Some(mouth)) => {
                FrameSignal::Sample(RatioSample::new(left, right, mouth, timestamp_ns))
            }
            (None, None, None) => FrameSignal::NoSignal { timestamp_ns },
            _ => return Err(ReplayError::IncompleteRatios { line }),
        };
        Ok((FaceId(self.face), signal))
    }
}

/// Counts for a finished replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub skipped: usize,
    pub commands: usize,
}

/// Feed every line through the monitor, writing each result as a JSON line
///
/// Bad lines and rejected samples are logged and skipped.
pub fn run_replay<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    monitor: &mut AlertnessMonitor,
    executor: &ExecutorHandle,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let (face_id, signal) = match SignalRecord::parse(text, line_no)
            .and_then(|record| record.to_signal(line_no))
        {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping input: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        let result: FrameResult = match monitor.process(face_id, signal) {
            Ok(result) => result,
            Err(e) => {
                warn!(face = %face_id, "Line {}: frame dropped: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
        };

        summary.frames += 1;
        summary.commands += executor.dispatch_result(&result);
        serde_json::to_writer(&mut output, &result)?;
        writeln!(output)?;
        debug!(face = %face_id, "Line {} -> {}", line_no, result.state.as_str());
    }

    output.flush()?;
    info!(
        "Replay finished: {} frames, {} skipped, {} commands",
        summary.frames, summary.skipped, summary.commands
    );
    Ok(summary)
}

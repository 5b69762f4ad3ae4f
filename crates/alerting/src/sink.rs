//! Output devices driven by the executor

use alertness::NotificationKind;
use thiserror::Error;
use tracing::{info, warn};

/// Output device failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Tone device unavailable: {0}")]
    ToneUnavailable(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Audible alarm output
///
/// `is_busy` reports the device's own play state and may lag behind the
/// last start/stop call.
pub trait ToneDevice {
    fn start(&mut self) -> Result<(), SinkError>;
    fn stop(&mut self) -> Result<(), SinkError>;
    fn is_busy(&self) -> bool;
}

/// Out-of-band message delivery (SMS, push, ...)
pub trait Notifier {
    fn send(&mut self, kind: NotificationKind, message: &str) -> Result<(), SinkError>;
}

/// Tone device that only logs
#[derive(Debug, Default)]
pub struct LogToneDevice {
    busy: bool,
}

impl ToneDevice for LogToneDevice {
    fn start(&mut self) -> Result<(), SinkError> {
        warn!("ALARM ON");
        self.busy = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SinkError> {
        info!("Alarm off");
        self.busy = false;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

/// Notifier that only logs
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&mut self, kind: NotificationKind, message: &str) -> Result<(), SinkError> {
        info!(kind = kind.as_str(), "Notification: {}", message);
        Ok(())
    }
}

//! Alertness thresholds and timing configuration

use serde::{Deserialize, Serialize};

use crate::AlertnessError;

/// Alertness state machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertnessConfig {
    /// Eye ratio at or below which an eye counts as closed
    pub closed_max: f64,

    /// Eye ratio at or below which an eye counts as partially closed
    pub partial_max: f64,

    /// Continuous closure required before sleeping is declared (milliseconds, strictly exceeded)
    pub sleep_duration_ms: u64,

    /// Mouth ratio above which the mouth counts as open for a yawn
    pub mouth_open_ratio: f64,

    /// Mouth-open episodes shorter than this count as yawns (milliseconds)
    pub yawn_debounce_ms: u64,

    /// Counted yawns before a break notification is sent
    pub yawn_threshold: u32,

    /// Send a notification once per sleep episode
    pub notify_on_sleep: bool,

    /// Consecutive frames without a face before a warning is logged
    pub no_signal_warn_frames: u32,
}

impl Default for AlertnessConfig {
    fn default() -> Self {
        Self::escalating()
    }
}

impl AlertnessConfig {
    /// Escalating profile: yawn counting with break suggestions and sleep notifications
    pub fn escalating() -> Self {
        Self {
            closed_max: 0.19,
            partial_max: 0.23,
            sleep_duration_ms: 3000,
            mouth_open_ratio: 0.8,
            yawn_debounce_ms: 2000,
            yawn_threshold: 3,
            notify_on_sleep: true,
            no_signal_warn_frames: 30,
        }
    }

    /// Simple profile: every yawn counts, alarm only on sleep
    pub fn simple() -> Self {
        Self {
            mouth_open_ratio: 0.7,
            yawn_threshold: 1,
            notify_on_sleep: false,
            ..Self::escalating()
        }
    }

    pub(crate) fn sleep_duration_ns(&self) -> u64 {
        self.sleep_duration_ms.saturating_mul(1_000_000)
    }

    pub(crate) fn yawn_debounce_ns(&self) -> u64 {
        self.yawn_debounce_ms.saturating_mul(1_000_000)
    }

    /// Check thresholds for consistency
    pub fn validate(&self) -> Result<(), AlertnessError> {
        for (name, value) in [
            ("closed_max", self.closed_max),
            ("partial_max", self.partial_max),
            ("mouth_open_ratio", self.mouth_open_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AlertnessError::Config(format!(
                    "{name} must be a positive finite ratio, got {value}"
                )));
            }
        }

        if self.closed_max >= self.partial_max {
            return Err(AlertnessError::Config(format!(
                "closed_max ({}) must be below partial_max ({})",
                self.closed_max, self.partial_max
            )));
        }

        if self.sleep_duration_ms == 0 {
            return Err(AlertnessError::Config("sleep_duration_ms must be non-zero".into()));
        }

        if self.yawn_debounce_ms == 0 {
            return Err(AlertnessError::Config("yawn_debounce_ms must be non-zero".into()));
        }

        if self.yawn_threshold == 0 {
            return Err(AlertnessError::Config("yawn_threshold must be at least 1".into()));
        }

        Ok(())
    }
}

//! Frame inputs, per-frame results and alert commands

use serde::{Deserialize, Serialize};

use crate::state::{AlertnessState, DwellCounters};
use crate::{AlertnessError, FaceId};

/// Ratios measured for one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSample {
    pub left_eye_ratio: f64,
    pub right_eye_ratio: f64,
    pub mouth_ratio: f64,
    /// Monotonic capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
}

impl RatioSample {
    pub fn new(left_eye_ratio: f64, right_eye_ratio: f64, mouth_ratio: f64, timestamp_ns: u64) -> Self {
        Self {
            left_eye_ratio,
            right_eye_ratio,
            mouth_ratio,
            timestamp_ns,
        }
    }

    /// Reject NaN, infinite and negative ratios
    pub fn validate(&self) -> Result<(), AlertnessError> {
        check_ratio("left_eye_ratio", self.left_eye_ratio)?;
        check_ratio("right_eye_ratio", self.right_eye_ratio)?;
        check_ratio("mouth_ratio", self.mouth_ratio)
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), AlertnessError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AlertnessError::InvalidSample { field, value })
    }
}

/// What the signal extractor produced for a tracked face this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FrameSignal {
    /// Face found and measured
    Sample(RatioSample),

    /// Face not found this frame
    NoSignal { timestamp_ns: u64 },
}

impl From<RatioSample> for FrameSignal {
    fn from(sample: RatioSample) -> Self {
        Self::Sample(sample)
    }
}

/// Kind of out-of-band notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Sustained eye closure crossed the sleep threshold
    DriverSleeping,

    /// Yawn count reached the escalation threshold
    FatigueBreakSuggested,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DriverSleeping => "driver_sleeping",
            Self::FatigueBreakSuggested => "fatigue_break_suggested",
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::DriverSleeping => "Driver is sleeping",
            Self::FatigueBreakSuggested => "Take a tea break",
        }
    }
}

/// Side effect requested from the effect executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AlertCommand {
    StartAlarm,
    StopAlarm,
    SendNotification {
        kind: NotificationKind,
        message: String,
    },
}

impl AlertCommand {
    /// Notification carrying the kind's standard message
    pub fn notify(kind: NotificationKind) -> Self {
        Self::SendNotification {
            kind,
            message: kind.default_message().to_string(),
        }
    }
}

/// Result of processing one frame for one face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub face_id: FaceId,

    /// False when the frame carried no signal for this face
    pub face_detected: bool,

    /// Dominant state for display
    pub state: AlertnessState,

    /// Commands to execute, alarm first
    pub commands: Vec<AlertCommand>,

    /// Dwell counters after this frame
    pub dwell: DwellCounters,

    /// Yawns counted toward the next break suggestion
    pub yawn_count: u32,
}

impl FrameResult {
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn starts_alarm(&self) -> bool {
        self.commands.contains(&AlertCommand::StartAlarm)
    }

    pub fn stops_alarm(&self) -> bool {
        self.commands.contains(&AlertCommand::StopAlarm)
    }

    /// Notification kinds emitted this frame
    pub fn notifications(&self) -> impl Iterator<Item = NotificationKind> + '_ {
        self.commands.iter().filter_map(|command| match command {
            AlertCommand::SendNotification { kind, .. } => Some(*kind),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_ratios() {
        assert!(RatioSample::new(0.3, 0.3, 0.2, 0).validate().is_ok());
        assert!(RatioSample::new(0.0, 0.0, 0.0, 0).validate().is_ok());

        let nan = RatioSample::new(f64::NAN, 0.3, 0.2, 0).validate();
        assert!(matches!(
            nan,
            Err(AlertnessError::InvalidSample { field: "left_eye_ratio", .. })
        ));

        let negative = RatioSample::new(0.3, 0.3, -0.1, 0).validate();
        assert!(matches!(
            negative,
            Err(AlertnessError::InvalidSample { field: "mouth_ratio", .. })
        ));

        assert!(RatioSample::new(0.3, f64::INFINITY, 0.2, 0).validate().is_err());
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&AlertCommand::StartAlarm).unwrap();
        assert_eq!(json, r#"{"command":"start_alarm"}"#);

        let json = serde_json::to_string(&AlertCommand::notify(NotificationKind::FatigueBreakSuggested)).unwrap();
        assert_eq!(
            json,
            r#"{"command":"send_notification","kind":"fatigue_break_suggested","message":"Take a tea break"}"#
        );
    }

    #[test]
    fn test_notifications_filter() {
        let result = FrameResult {
            face_id: FaceId(0),
            face_detected: true,
            state: AlertnessState::Sleeping,
            commands: vec![
                AlertCommand::StartAlarm,
                AlertCommand::notify(NotificationKind::DriverSleeping),
            ],
            dwell: DwellCounters::default(),
            yawn_count: 0,
        };
        assert!(result.starts_alarm());
        assert!(!result.stops_alarm());
        assert_eq!(
            result.notifications().collect::<Vec<_>>(),
            vec![NotificationKind::DriverSleeping]
        );
    }
}

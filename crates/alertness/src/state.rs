//! Per-face session state

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{AlertCommand, FrameResult, NotificationKind, RatioSample};
use crate::classifier::RatioClassifier;
use crate::closure::{ClosureStatus, ClosureTimer};
use crate::config::AlertnessConfig;
use crate::yawn::{YawnEpisode, YawnEvent};
use crate::{AlertnessError, FaceId};

/// Dominant alertness condition for a frame
///
/// Ordered by display precedence: `Sleeping > Yawning > Drowsy > Active`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AlertnessState {
    #[default]
    Active,
    Drowsy,
    Yawning,
    Sleeping,
}

impl AlertnessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Drowsy => "drowsy",
            Self::Yawning => "yawning",
            Self::Sleeping => "sleeping",
        }
    }

    /// Text for an on-screen status overlay
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active :)",
            Self::Drowsy => "Drowsy !",
            Self::Yawning => "Yawning",
            Self::Sleeping => "SLEEPING !!!",
        }
    }
}

/// Consecutive frames spent in each eye-derived condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DwellCounters {
    pub sleep: u64,
    pub drowsy: u64,
    pub active: u64,
}

impl DwellCounters {
    fn record_closed(&mut self) {
        self.sleep += 1;
        self.drowsy = 0;
        self.active = 0;
    }

    fn record_drowsy(&mut self) {
        self.sleep = 0;
        self.drowsy += 1;
        self.active = 0;
    }

    fn record_active(&mut self) {
        self.sleep = 0;
        self.drowsy = 0;
        self.active += 1;
    }
}

/// Last commanded alarm state
///
/// Start is only issued while stopped and stop only while playing; the flag
/// is updated when the command is emitted, not when the device confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmChannel {
    playing: bool,
}

impl AlarmChannel {
    pub fn start(&mut self) -> Option<AlertCommand> {
        if self.playing {
            return None;
        }
        self.playing = true;
        Some(AlertCommand::StartAlarm)
    }

    pub fn stop(&mut self) -> Option<AlertCommand> {
        if !self.playing {
            return None;
        }
        self.playing = false;
        Some(AlertCommand::StopAlarm)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Everything the state machine tracks for one face
#[derive(Debug, Clone)]
pub struct SessionState {
    face_id: FaceId,
    closure: ClosureTimer,
    yawn: YawnEpisode,
    alarm: AlarmChannel,
    dwell: DwellCounters,
    /// State derived from the eyes alone
    eye_state: AlertnessState,
    /// State reported for the last frame
    state: AlertnessState,
    last_timestamp_ns: Option<u64>,
    no_signal_frames: u32,
}

impl SessionState {
    pub fn new(face_id: FaceId) -> Self {
        Self {
            face_id,
            closure: ClosureTimer::new(),
            yawn: YawnEpisode::new(),
            alarm: AlarmChannel::default(),
            dwell: DwellCounters::default(),
            eye_state: AlertnessState::Active,
            state: AlertnessState::Active,
            last_timestamp_ns: None,
            no_signal_frames: 0,
        }
    }

    /// Advance the state machine by one measured frame
    ///
    /// On error nothing is modified.
    pub fn process_sample(
        &mut self,
        config: &AlertnessConfig,
        sample: &RatioSample,
    ) -> Result<FrameResult, AlertnessError> {
        sample.validate()?;
        self.check_timestamp(sample.timestamp_ns)?;

        let now = sample.timestamp_ns;
        let classifier = RatioClassifier::new(config);
        let left = classifier.classify_eye(sample.left_eye_ratio);
        let right = classifier.classify_eye(sample.right_eye_ratio);

        let mut commands = Vec::new();
        let mut notifications = Vec::new();

        if left.is_closed() || right.is_closed() {
            self.dwell.record_closed();

            match self.closure.observe_closed(now, config.sleep_duration_ns()) {
                ClosureStatus::Started => {}
                ClosureStatus::Pending { elapsed_ns } => {
                    debug!(
                        face = %self.face_id,
                        "Eyes closed for {}ms of {}ms",
                        elapsed_ns / 1_000_000,
                        config.sleep_duration_ms
                    );
                }
                ClosureStatus::Sleeping { elapsed_ns, onset } => {
                    if onset {
                        warn!(
                            face = %self.face_id,
                            "Eyes closed for {}ms, driver sleeping",
                            elapsed_ns / 1_000_000
                        );
                        if config.notify_on_sleep {
                            notifications.push(AlertCommand::notify(NotificationKind::DriverSleeping));
                        }
                    }
                    self.eye_state = AlertnessState::Sleeping;
                    commands.extend(self.alarm.start());
                }
            }
        } else {
            if let Some(duration_ns) = self.closure.clear(now) {
                debug!(face = %self.face_id, "Eye closure ended after {}ms", duration_ns / 1_000_000);
            }
            commands.extend(self.alarm.stop());

            self.eye_state = if left.is_partially_closed() || right.is_partially_closed() {
                self.dwell.record_drowsy();
                AlertnessState::Drowsy
            } else {
                self.dwell.record_active();
                AlertnessState::Active
            };
        }

        let mouth_open = classifier.classify_mouth(sample.mouth_ratio);
        let yawn = self.yawn.observe(
            mouth_open,
            now,
            config.yawn_debounce_ns(),
            config.yawn_threshold,
        );
        if let YawnEvent::Escalated { count } = yawn {
            info!(face = %self.face_id, "{} yawns counted, suggesting a break", count);
            notifications.push(AlertCommand::notify(NotificationKind::FatigueBreakSuggested));
        }

        let state = if self.yawn.is_mouth_open() {
            self.eye_state.max(AlertnessState::Yawning)
        } else {
            self.eye_state
        };

        if state != self.state {
            info!(
                face = %self.face_id,
                "Alertness changed: {} -> {}",
                self.state.as_str(),
                state.as_str()
            );
        }

        commands.extend(notifications);
        self.state = state;
        self.last_timestamp_ns = Some(now);
        self.no_signal_frames = 0;

        Ok(self.result(true, commands))
    }

    /// Record a frame in which the face was not found
    ///
    /// Timers and counters are frozen, not reset.
    pub fn process_no_signal(
        &mut self,
        config: &AlertnessConfig,
        timestamp_ns: u64,
    ) -> Result<FrameResult, AlertnessError> {
        self.check_timestamp(timestamp_ns)?;

        self.last_timestamp_ns = Some(timestamp_ns);
        self.no_signal_frames = self.no_signal_frames.saturating_add(1);
        if self.no_signal_frames == config.no_signal_warn_frames {
            warn!(
                face = %self.face_id,
                "No signal for {} consecutive frames",
                self.no_signal_frames
            );
        }

        Ok(self.result(false, Vec::new()))
    }

    /// Drop all tracking, returning a stop command if the alarm was playing
    pub fn reset(&mut self) -> Option<AlertCommand> {
        let stop = self.alarm.stop();
        *self = Self::new(self.face_id);
        stop
    }

    fn check_timestamp(&self, timestamp_ns: u64) -> Result<(), AlertnessError> {
        match self.last_timestamp_ns {
            Some(previous_ns) if timestamp_ns < previous_ns => {
                Err(AlertnessError::NonMonotonicTimestamp {
                    previous_ns,
                    current_ns: timestamp_ns,
                })
            }
            _ => Ok(()),
        }
    }

    fn result(&self, face_detected: bool, commands: Vec<AlertCommand>) -> FrameResult {
        FrameResult {
            face_id: self.face_id,
            face_detected,
            state: self.state,
            commands,
            dwell: self.dwell,
            yawn_count: self.yawn.yawn_count(),
        }
    }

    pub fn face_id(&self) -> FaceId {
        self.face_id
    }

    pub fn state(&self) -> AlertnessState {
        self.state
    }

    pub fn eye_state(&self) -> AlertnessState {
        self.eye_state
    }

    pub fn dwell(&self) -> DwellCounters {
        self.dwell
    }

    pub fn closure(&self) -> &ClosureTimer {
        &self.closure
    }

    pub fn yawn(&self) -> &YawnEpisode {
        &self.yawn
    }

    pub fn alarm(&self) -> AlarmChannel {
        self.alarm
    }

    pub fn last_timestamp_ns(&self) -> Option<u64> {
        self.last_timestamp_ns
    }

    pub fn no_signal_frames(&self) -> u32 {
        self.no_signal_frames
    }
}

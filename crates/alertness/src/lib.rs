//! Alertness State Machine
//!
//! Real-time driver alertness classification from per-frame facial ratios:
//! - Eye openness classification (open, partially closed, closed)
//! - Sustained eye closure detection with alarm start/stop
//! - Drowsy / active dwell tracking
//! - Yawn debounce and break-suggestion escalation
//!
//! The monitor consumes ratios and emits [`AlertCommand`]s; executing them
//! (tone playback, message delivery) is left to the caller.

pub mod analysis;
pub mod classifier;
pub mod closure;
pub mod config;
pub mod geometry;
pub mod state;
pub mod yawn;

pub use analysis::{AlertCommand, FrameResult, FrameSignal, NotificationKind, RatioSample};
pub use classifier::{EyeOpenness, RatioClassifier};
pub use config::AlertnessConfig;
pub use geometry::{FaceLandmarks, Point};
pub use state::{AlarmChannel, AlertnessState, DwellCounters, SessionState};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Alertness error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertnessError {
    #[error("Invalid sample: {field} = {value}")]
    InvalidSample { field: &'static str, value: f64 },

    #[error("Timestamp went backwards: {current_ns}ns after {previous_ns}ns")]
    NonMonotonicTimestamp { previous_ns: u64, current_ns: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark geometry error: {0}")]
    Geometry(String),
}

impl AlertnessError {
    /// Whether the frame was dropped because its sample was unusable
    pub fn is_invalid_sample(&self) -> bool {
        matches!(
            self,
            Self::InvalidSample { .. } | Self::NonMonotonicTimestamp { .. }
        )
    }
}

/// Identifier of a tracked face
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face-{}", self.0)
    }
}

impl From<u32> for FaceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Alertness monitor over any number of tracked faces
///
/// Each face owns an independent [`SessionState`], created on its first frame.
pub struct AlertnessMonitor {
    config: AlertnessConfig,
    sessions: HashMap<FaceId, SessionState>,
}

impl AlertnessMonitor {
    /// Create a monitor, rejecting inconsistent configuration
    pub fn new(config: AlertnessConfig) -> Result<Self, AlertnessError> {
        config.validate()?;
        info!("Creating alertness monitor with config: {:?}", config);
        Ok(Self {
            config,
            sessions: HashMap::new(),
        })
    }

    /// Process one frame's signal for a face
    pub fn process(&mut self, face_id: FaceId, signal: FrameSignal) -> Result<FrameResult, AlertnessError> {
        match signal {
            FrameSignal::Sample(sample) => self.process_frame(face_id, sample),
            FrameSignal::NoSignal { timestamp_ns } => self.process_no_signal(face_id, timestamp_ns),
        }
    }

    /// Process a measured frame for a face
    pub fn process_frame(&mut self, face_id: FaceId, sample: RatioSample) -> Result<FrameResult, AlertnessError> {
        sample.validate()?;
        let config = &self.config;
        self.sessions
            .entry(face_id)
            .or_insert_with(|| {
                debug!("Tracking new face {}", face_id);
                SessionState::new(face_id)
            })
            .process_sample(config, &sample)
    }

    /// Process a frame in which the face was not found
    pub fn process_no_signal(&mut self, face_id: FaceId, timestamp_ns: u64) -> Result<FrameResult, AlertnessError> {
        let config = &self.config;
        self.sessions
            .entry(face_id)
            .or_insert_with(|| SessionState::new(face_id))
            .process_no_signal(config, timestamp_ns)
    }

    /// Session state for a face, if it has been seen
    pub fn session(&self, face_id: FaceId) -> Option<&SessionState> {
        self.sessions.get(&face_id)
    }

    /// Faces with a session, in ascending id order
    pub fn tracked_faces(&self) -> Vec<FaceId> {
        let mut faces: Vec<_> = self.sessions.keys().copied().collect();
        faces.sort();
        faces
    }

    /// Reset a face's state (on driver change); returns commands to apply
    pub fn reset_face(&mut self, face_id: FaceId) -> Vec<AlertCommand> {
        match self.sessions.get_mut(&face_id) {
            Some(session) => {
                info!("Resetting alertness state for {}", face_id);
                session.reset().into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Stop tracking a face; returns commands to apply
    pub fn remove_face(&mut self, face_id: FaceId) -> Vec<AlertCommand> {
        match self.sessions.remove(&face_id) {
            Some(mut session) => {
                info!("Stopped tracking {}", face_id);
                session.reset().into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn config(&self) -> &AlertnessConfig {
        &self.config
    }
}

//! Eye and mouth ratio classification

use serde::{Deserialize, Serialize};

use crate::config::AlertnessConfig;

/// Openness of a single eye
///
/// Ordered from most closed to most open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EyeOpenness {
    Closed,
    PartiallyClosed,
    Open,
}

impl EyeOpenness {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_partially_closed(&self) -> bool {
        matches!(self, Self::PartiallyClosed)
    }
}

/// Threshold classifier for eye and mouth aspect ratios
///
/// Boundaries are closed-inclusive: a ratio equal to `closed_max` is
/// `Closed`, equal to `partial_max` is `PartiallyClosed`. The mouth counts
/// as open only strictly above `mouth_open_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioClassifier {
    closed_max: f64,
    partial_max: f64,
    mouth_open_ratio: f64,
}

impl RatioClassifier {
    pub fn new(config: &AlertnessConfig) -> Self {
        Self {
            closed_max: config.closed_max,
            partial_max: config.partial_max,
            mouth_open_ratio: config.mouth_open_ratio,
        }
    }

    /// Classify one eye aspect ratio
    pub fn classify_eye(&self, ratio: f64) -> EyeOpenness {
        if ratio <= self.closed_max {
            EyeOpenness::Closed
        } else if ratio <= self.partial_max {
            EyeOpenness::PartiallyClosed
        } else {
            EyeOpenness::Open
        }
    }

    /// Whether the mouth aspect ratio is wide enough to count as a yawn
    pub fn classify_mouth(&self, ratio: f64) -> bool {
        ratio > self.mouth_open_ratio
    }
}

impl Default for RatioClassifier {
    fn default() -> Self {
        Self::new(&AlertnessConfig::default())
    }
}

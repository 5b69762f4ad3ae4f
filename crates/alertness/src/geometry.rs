//! Eye and mouth aspect ratios from 68-point facial landmarks

use serde::{Deserialize, Serialize};

use crate::analysis::RatioSample;
use crate::AlertnessError;

/// Number of points in a dlib-style facial landmark set
pub const LANDMARK_COUNT: usize = 68;

const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;
const MOUTH: std::ops::Range<usize> = 48..68;

/// Image-space landmark position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Eye aspect ratio over six eye landmarks
///
/// Points are ordered outer corner, two upper lid points, inner corner,
/// two lower lid points.
pub fn eye_aspect_ratio(eye: &[Point]) -> Result<f64, AlertnessError> {
    if eye.len() != 6 {
        return Err(AlertnessError::Geometry(format!(
            "eye needs 6 landmarks, got {}",
            eye.len()
        )));
    }

    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);
    ratio(vertical, horizontal, "eye")
}

/// Mouth aspect ratio over the 20 mouth landmarks
pub fn mouth_aspect_ratio(mouth: &[Point]) -> Result<f64, AlertnessError> {
    if mouth.len() != MOUTH.len() {
        return Err(AlertnessError::Geometry(format!(
            "mouth needs {} landmarks, got {}",
            MOUTH.len(),
            mouth.len()
        )));
    }

    let vertical = mouth[2].distance(&mouth[10]) + mouth[4].distance(&mouth[8]);
    let horizontal = mouth[0].distance(&mouth[6]);
    ratio(vertical, horizontal, "mouth")
}

fn ratio(vertical: f64, horizontal: f64, part: &str) -> Result<f64, AlertnessError> {
    if !(horizontal.is_finite() && horizontal > f64::EPSILON) || !vertical.is_finite() {
        return Err(AlertnessError::Geometry(format!(
            "degenerate {part} landmarks (width {horizontal})"
        )));
    }
    Ok(vertical / (2.0 * horizontal))
}

/// Full landmark set for one face in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl TryFrom<Vec<Point>> for FaceLandmarks {
    type Error = AlertnessError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<FaceLandmarks> for Vec<Point> {
    fn from(landmarks: FaceLandmarks) -> Self {
        landmarks.points
    }
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Result<Self, AlertnessError> {
        if points.len() != LANDMARK_COUNT {
            return Err(AlertnessError::Geometry(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn region(&self, range: std::ops::Range<usize>, part: &str) -> Result<&[Point], AlertnessError> {
        self.points.get(range.clone()).ok_or_else(|| {
            AlertnessError::Geometry(format!(
                "{part} landmarks {range:?} missing from {} points",
                self.points.len()
            ))
        })
    }

    pub fn left_eye_ratio(&self) -> Result<f64, AlertnessError> {
        eye_aspect_ratio(self.region(LEFT_EYE, "left eye")?)
    }

    pub fn right_eye_ratio(&self) -> Result<f64, AlertnessError> {
        eye_aspect_ratio(self.region(RIGHT_EYE, "right eye")?)
    }

    pub fn mouth_ratio(&self) -> Result<f64, AlertnessError> {
        mouth_aspect_ratio(self.region(MOUTH, "mouth")?)
    }

    /// Reduce the landmarks to the ratios the state machine consumes
    pub fn to_sample(&self, timestamp_ns: u64) -> Result<RatioSample, AlertnessError> {
        Ok(RatioSample::new(
            self.left_eye_ratio()?,
            self.right_eye_ratio()?,
            self.mouth_ratio()?,
            timestamp_ns,
        ))
    }
}

//! Hand landmark types and the live observation plumbing around the detector.
//!
//! The detector itself is external; it is modelled by [`LandmarkDetector`] and
//! driven by [`LandmarkFeed`], which keeps [`LatestFrame`] up to date for any
//! number of readers.

mod feed;
mod replay;
mod slot;

pub use feed::{DetectorError, LandmarkDetector, LandmarkFeed};
pub use replay::ReplayDetector;
pub use slot::LatestFrame;

use serde::{Deserialize, Serialize};

/// Number of tracked points per hand.
pub const LANDMARK_COUNT: usize = 21;
/// Coordinates stored per landmark.
pub const COORDS_PER_LANDMARK: usize = 3;
/// Length of a flattened sample.
pub const FEATURE_LEN: usize = LANDMARK_COUNT * COORDS_PER_LANDMARK;

/// Flattened landmarks in `x0, y0, z0, x1, ...` order.
pub type FeatureVector = [f32; FEATURE_LEN];

/// One normalized 3-D point on the hand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Landmarks of one hand captured at one instant.
///
/// A well-formed sample holds exactly [`LANDMARK_COUNT`] points in the
/// detector's anatomical order (wrist first, pinky tip last).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub landmarks: Vec<Landmark>,
}

impl Sample {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn has_full_arity(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    pub fn is_finite(&self) -> bool {
        self.landmarks.iter().all(Landmark::is_finite)
    }
}

/// Detector output for one video frame: zero or more hands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandFrame {
    /// Detector timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// One landmark list per detected hand.
    #[serde(default)]
    pub landmarks: Vec<Vec<Landmark>>,
}

impl HandFrame {
    pub fn new(timestamp_ms: f64, landmarks: Vec<Vec<Landmark>>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    /// Landmarks of the first detected hand, if any.
    pub fn first_hand(&self) -> Option<&[Landmark]> {
        self.landmarks.first().map(Vec::as_slice)
    }

    pub fn has_hand(&self) -> bool {
        !self.landmarks.is_empty()
    }
}

/// Flatten one hand into a feature vector, or `None` when the arity is wrong.
pub fn flatten(landmarks: &[Landmark]) -> Option<FeatureVector> {
    if landmarks.len() != LANDMARK_COUNT {
        return None;
    }
    let mut out = [0.0f32; FEATURE_LEN];
    for (chunk, landmark) in out.chunks_exact_mut(COORDS_PER_LANDMARK).zip(landmarks) {
        chunk[0] = landmark.x;
        chunk[1] = landmark.y;
        chunk[2] = landmark.z;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand() -> Vec<Landmark> {
        (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f32, i as f32 + 0.25, -(i as f32)))
            .collect()
    }

    #[test]
    fn flatten_interleaves_coordinates() {
        let features = flatten(&hand()).unwrap();
        assert_eq!(features.len(), 63);
        assert_eq!(&features[..6], &[0.0, 0.25, -0.0, 1.0, 1.25, -1.0]);
        assert_eq!(features[60], 20.0);
        assert_eq!(features[62], -20.0);
    }

    #[test]
    fn flatten_rejects_wrong_arity() {
        let mut short = hand();
        short.pop();
        assert!(flatten(&short).is_none());
        assert!(flatten(&[]).is_none());
    }

    #[test]
    fn frame_json_uses_detector_field_names() {
        let json = r#"{"timestampMs": 33.5, "landmarks": [[{"x": 0.1, "y": 0.2, "z": 0.3}]]}"#;
        let frame: HandFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp_ms, 33.5);
        assert_eq!(frame.first_hand().unwrap()[0], Landmark::new(0.1, 0.2, 0.3));

        let empty: HandFrame = serde_json::from_str(r#"{"timestampMs": 1.0}"#).unwrap();
        assert!(!empty.has_hand());
    }
}

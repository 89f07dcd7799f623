use super::{Dataset, ValidationError};
use crate::landmarks::{LatestFrame, Sample};

/// Captures the first hand of the latest detector frame as a labeled sample.
#[derive(Debug, Clone)]
pub struct DatasetRecorder {
    frames: LatestFrame,
}

impl DatasetRecorder {
    pub fn new(frames: LatestFrame) -> Self {
        Self { frames }
    }

    /// Append the current hand pose to `label`, returning the class size.
    pub fn capture(&self, dataset: &mut Dataset, label: &str) -> Result<usize, ValidationError> {
        let frame = self.frames.latest().ok_or(ValidationError::NoHand)?;
        let hand = frame.first_hand().ok_or(ValidationError::NoHand)?;
        let count = dataset.add_sample(label, Sample::new(hand.to_vec()))?;
        tracing::debug!(label, count, "Captured gesture sample");
        Ok(count)
    }
}

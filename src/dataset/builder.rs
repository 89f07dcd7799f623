use super::{Dataset, ValidationError};
use crate::landmarks::{FeatureVector, flatten};

/// One flattened sample and the label it was captured under.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub label: String,
}

/// Flatten every sample of `dataset` into training examples.
///
/// Classes are visited in insertion order and samples in insertion order
/// within each class; nothing is shuffled here. Fails on the first sample
/// without exactly 21 landmarks.
pub fn format(dataset: &Dataset) -> Result<Vec<TrainingExample>, ValidationError> {
    let mut examples = Vec::with_capacity(dataset.sample_count());
    for class in dataset.classes() {
        for (index, sample) in class.samples.iter().enumerate() {
            let features =
                flatten(&sample.landmarks).ok_or_else(|| ValidationError::LandmarkCount {
                    label: class.label.clone(),
                    index,
                    found: sample.landmarks.len(),
                })?;
            examples.push(TrainingExample {
                features,
                label: class.label.clone(),
            });
        }
    }
    Ok(examples)
}

//! Labeled landmark samples and their conversion into training examples.
//!
//! A [`Dataset`] keeps classes in insertion order and samples in insertion
//! order within each class, so formatting is fully deterministic.

mod builder;
mod recorder;
mod upload;

pub use builder::{TrainingExample, format};
pub use recorder::DatasetRecorder;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::landmarks::{LANDMARK_COUNT, Sample};

/// Malformed training data or structurally invalid samples.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed training data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read training data {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write training data {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Class label must not be empty")]
    EmptyLabel,
    #[error("Duplicate class label '{0}'")]
    DuplicateLabel(String),
    #[error("Sample {index} of class '{label}' has {found} landmarks (expected 21)")]
    LandmarkCount {
        label: String,
        index: usize,
        found: usize,
    },
    #[error("Sample {index} of class '{label}' contains a non-finite coordinate")]
    NonFinite { label: String, index: usize },
    #[error("No training data loaded")]
    NoDataset,
    #[error("No hand visible in the latest frame")]
    NoHand,
}

/// One gesture label and its captured samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureClass {
    pub label: String,
    pub samples: Vec<Sample>,
}

impl GestureClass {
    pub fn new(label: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            samples,
        }
    }
}

/// Ordered mapping from label to [`GestureClass`]; labels are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    classes: Vec<GestureClass>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from classes, enforcing unique non-empty labels.
    ///
    /// Sample arity is not checked here; [`Dataset::validate`] and [`format`]
    /// reject malformed samples.
    pub fn from_classes(classes: Vec<GestureClass>) -> Result<Self, ValidationError> {
        let mut dataset = Self::new();
        for class in classes {
            if class.label.is_empty() {
                return Err(ValidationError::EmptyLabel);
            }
            if dataset.class(&class.label).is_some() {
                return Err(ValidationError::DuplicateLabel(class.label));
            }
            dataset.classes.push(class);
        }
        Ok(dataset)
    }

    /// Append a sample to `label`, creating the class on first use.
    ///
    /// The dataset is left unchanged when the sample is rejected.
    pub fn add_sample(&mut self, label: &str, sample: Sample) -> Result<usize, ValidationError> {
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        let existing = self.classes.iter().position(|class| class.label == label);
        let index = existing.map_or(0, |idx| self.classes[idx].samples.len());
        check_sample(label, index, &sample)?;
        match existing {
            Some(idx) => self.classes[idx].samples.push(sample),
            None => self.classes.push(GestureClass::new(label, vec![sample])),
        }
        Ok(index + 1)
    }

    pub fn classes(&self) -> &[GestureClass] {
        &self.classes
    }

    pub fn class(&self, label: &str) -> Option<&GestureClass> {
        self.classes.iter().find(|class| class.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|class| class.label.as_str())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Total number of samples across all classes.
    pub fn sample_count(&self) -> usize {
        self.classes.iter().map(|class| class.samples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// Check every sample for full arity and finite coordinates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for class in &self.classes {
            for (index, sample) in class.samples.iter().enumerate() {
                check_sample(&class.label, index, sample)?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            classes: self
                .classes
                .iter()
                .map(|class| (class.label.clone(), class.samples.len()))
                .collect(),
        }
    }
}

fn check_sample(label: &str, index: usize, sample: &Sample) -> Result<(), ValidationError> {
    if sample.landmarks.len() != LANDMARK_COUNT {
        return Err(ValidationError::LandmarkCount {
            label: label.to_string(),
            index,
            found: sample.landmarks.len(),
        });
    }
    if !sample.is_finite() {
        return Err(ValidationError::NonFinite {
            label: label.to_string(),
            index,
        });
    }
    Ok(())
}

/// Per-class sample counts, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub classes: Vec<(String, usize)>,
}

impl DatasetSummary {
    pub fn sample_count(&self) -> usize {
        self.classes.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classes, {} samples",
            self.classes.len(),
            self.sample_count()
        )?;
        for (label, count) in &self.classes {
            write!(f, "\n  {label}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn sample(value: f32) -> Sample {
        Sample::new(vec![Landmark::new(value, value, value); LANDMARK_COUNT])
    }

    #[test]
    fn add_sample_keeps_insertion_order() {
        let mut dataset = Dataset::new();
        assert_eq!(dataset.add_sample("open", sample(0.1)).unwrap(), 1);
        assert_eq!(dataset.add_sample("closed", sample(0.2)).unwrap(), 1);
        assert_eq!(dataset.add_sample("open", sample(0.3)).unwrap(), 2);

        assert_eq!(dataset.labels().collect::<Vec<_>>(), vec!["open", "closed"]);
        assert_eq!(dataset.class("open").unwrap().samples[1], sample(0.3));
        assert_eq!(dataset.sample_count(), 3);
    }

    #[test]
    fn rejected_sample_leaves_dataset_untouched() {
        let mut dataset = Dataset::new();
        dataset.add_sample("open", sample(0.1)).unwrap();
        let before = dataset.clone();

        let short = Sample::new(vec![Landmark::default(); 20]);
        let err = dataset.add_sample("open", short).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::LandmarkCount { index: 1, found: 20, .. }
        ));
        let err = dataset.add_sample("fist", sample(f32::NAN)).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { .. }));
        assert_eq!(dataset, before);
    }

    #[test]
    fn from_classes_rejects_duplicate_labels() {
        let err = Dataset::from_classes(vec![
            GestureClass::new("open", vec![sample(0.1)]),
            GestureClass::new("open", vec![sample(0.2)]),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateLabel(label) if label == "open"));
    }

    #[test]
    fn summary_lists_counts_in_order() {
        let mut dataset = Dataset::new();
        dataset.add_sample("open", sample(0.1)).unwrap();
        dataset.add_sample("open", sample(0.2)).unwrap();
        dataset.add_sample("closed", sample(0.3)).unwrap();
        let summary = dataset.summary();
        assert_eq!(
            summary.classes,
            vec![("open".to_string(), 2), ("closed".to_string(), 1)]
        );
        assert!(summary.to_string().starts_with("2 classes, 3 samples"));
    }
}

//! Crate-level error wrapping every pipeline failure.

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;
use crate::dataset::ValidationError;
use crate::inference::InferenceError;
use crate::landmarks::DetectorError;
use crate::training::TrainingError;

#[derive(Debug, Error)]
pub enum HandsignError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Training(TrainingError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
}

/// Coarse grouping used when reporting failures to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Training,
    Artifact,
    Config,
    Runtime,
}

impl HandsignError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HandsignError::Validation(_) => ErrorCategory::Validation,
            HandsignError::Training(_) => ErrorCategory::Training,
            HandsignError::Artifact(_) => ErrorCategory::Artifact,
            HandsignError::Config(_) => ErrorCategory::Config,
            HandsignError::Inference(_) | HandsignError::Detector(_) => ErrorCategory::Runtime,
        }
    }
}

impl From<ValidationError> for HandsignError {
    fn from(err: ValidationError) -> Self {
        HandsignError::Validation(err)
    }
}

impl From<TrainingError> for HandsignError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::Validation(inner) => HandsignError::Validation(inner),
            other => HandsignError::Training(other),
        }
    }
}

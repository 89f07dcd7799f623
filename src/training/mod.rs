//! Bounded classifier training with per-epoch progress.

mod job;
mod session;

pub use job::{TrainingJob, TrainingMessage, spawn_training};
pub use session::{TrainingSession, TrainingStatus};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::dataset::{self, Dataset, ValidationError};
use crate::landmarks::FEATURE_LEN;
use crate::ml::{GestureClassifier, ModelKind, mlp};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid training options: {0}")]
    InvalidOptions(String),
    #[error("Training data has no samples")]
    EmptyDataset,
    #[error("Training diverged at epoch {epoch} (non-finite loss)")]
    Diverged { epoch: usize },
    #[error("Training cancelled after {completed_epochs} epochs")]
    Cancelled { completed_epochs: usize },
    #[error("A training run is already in progress")]
    AlreadyRunning,
    #[error("Training failed: {0}")]
    Backend(String),
}

/// Hyperparameters and shape of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub hidden_units: usize,
    pub input_size: usize,
    /// Expected class count; the dataset decides when unset.
    pub output_size: Option<usize>,
    pub seed: u64,
    pub shuffle: bool,
    pub model_kind: ModelKind,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.2,
            hidden_units: 16,
            input_size: FEATURE_LEN,
            output_size: None,
            seed: 42,
            shuffle: true,
            model_kind: ModelKind::MlpV1,
        }
    }
}

impl TrainOptions {
    /// Check option ranges against a dataset with `class_count` labels.
    pub fn validate(&self, class_count: usize) -> Result<(), TrainingError> {
        if self.epochs == 0 {
            return Err(TrainingError::InvalidOptions(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(TrainingError::InvalidOptions(format!(
                "learning rate {} is outside (0, 1]",
                self.learning_rate
            )));
        }
        if self.hidden_units == 0 {
            return Err(TrainingError::InvalidOptions(
                "hidden units must be at least 1".to_string(),
            ));
        }
        if self.input_size != FEATURE_LEN {
            return Err(TrainingError::InvalidOptions(format!(
                "input size {} (expected {FEATURE_LEN})",
                self.input_size
            )));
        }
        if let Some(expected) = self.output_size {
            if expected != class_count {
                return Err(TrainingError::InvalidOptions(format!(
                    "output size {expected} does not match {class_count} labels"
                )));
            }
        }
        Ok(())
    }
}

/// Shared flag checked by the trainer between epochs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs training and records progress in a [`TrainingSession`].
#[derive(Debug)]
pub struct Trainer {
    options: TrainOptions,
    cancel: CancelToken,
    session: TrainingSession,
}

impl Trainer {
    pub fn new(options: TrainOptions) -> Self {
        Self::with_cancel(options, CancelToken::new())
    }

    pub fn with_cancel(options: TrainOptions, cancel: CancelToken) -> Self {
        Self {
            options,
            cancel,
            session: TrainingSession::new(),
        }
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Session of the most recent [`Trainer::train`] call.
    pub fn session(&self) -> &TrainingSession {
        &self.session
    }

    /// Train a new classifier on `dataset`.
    ///
    /// Every call starts a fresh session. `on_epoch` receives `(epoch, loss)`
    /// once per completed epoch with epochs counted from 1. Nothing is
    /// persisted.
    pub fn train(
        &mut self,
        dataset: &Dataset,
        mut on_epoch: impl FnMut(usize, f32),
    ) -> Result<Arc<dyn GestureClassifier>, TrainingError> {
        self.session.start();
        let result = self.run(dataset, &mut on_epoch);
        match &result {
            Ok(_) => {
                self.session.complete();
                tracing::info!(
                    "Training finished after {} epochs (final loss {:?})",
                    self.session.epoch(),
                    self.session.last_loss()
                );
            }
            Err(err) => {
                self.session.fail();
                tracing::warn!("Training failed: {err}");
            }
        }
        result
    }

    fn run(
        &mut self,
        dataset: &Dataset,
        on_epoch: &mut dyn FnMut(usize, f32),
    ) -> Result<Arc<dyn GestureClassifier>, TrainingError> {
        let examples = dataset::format(dataset)?;
        if examples.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        let labels: Vec<String> = dataset.labels().map(str::to_string).collect();
        self.options.validate(labels.len())?;
        tracing::info!(
            "Training {} on {} examples across {} classes ({} epochs, batch {}, lr {})",
            self.options.model_kind,
            examples.len(),
            labels.len(),
            self.options.epochs,
            self.options.batch_size,
            self.options.learning_rate
        );

        let session = &mut self.session;
        let mut report = |epoch: usize, loss: f32| {
            session.record_epoch(epoch, loss);
            on_epoch(epoch, loss);
        };
        match self.options.model_kind {
            ModelKind::MlpV1 => {
                let model =
                    mlp::train_mlp(&examples, &labels, &self.options, &self.cancel, &mut report)?;
                Ok(Arc::new(model))
            }
        }
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::FEATURE_LEN;
use crate::ml::ModelKind;
use crate::training::TrainOptions;

/// Settings persisted in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
}

/// Classifier shape preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Feature vector length fed to the classifier.
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    /// Expected class count; derived from the dataset when unset.
    #[serde(default)]
    pub output_size: Option<usize>,
    /// Width of the hidden layer.
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,
    /// Verbose logging for training and inference.
    #[serde(default)]
    pub debug: bool,
    /// Backend used for new models.
    #[serde(default)]
    pub kind: ModelKind,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            input_size: default_input_size(),
            output_size: None,
            hidden_units: default_hidden_units(),
            debug: false,
            kind: ModelKind::default(),
        }
    }
}

/// Training hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Shuffle example order at the start of every epoch.
    #[serde(default = "default_true")]
    pub shuffle: bool,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            seed: default_seed(),
            shuffle: true,
        }
    }
}

/// Real-time classification loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Default directory for saved models; falls back to `<app root>/models`.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            model_dir: None,
        }
    }
}

impl AppConfig {
    /// Training options assembled from the model and training sections.
    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            epochs: self.training.epochs,
            batch_size: self.training.batch_size,
            learning_rate: self.training.learning_rate,
            hidden_units: self.model.hidden_units,
            input_size: self.model.input_size,
            output_size: self.model.output_size,
            seed: self.training.seed,
            shuffle: self.training.shuffle,
            model_kind: self.model.kind,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.inference.tick_interval_ms.max(1))
    }
}

fn default_input_size() -> usize {
    FEATURE_LEN
}

fn default_hidden_units() -> usize {
    16
}

fn default_epochs() -> usize {
    50
}

fn default_batch_size() -> usize {
    32
}

fn default_learning_rate() -> f32 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_true() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    125
}

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

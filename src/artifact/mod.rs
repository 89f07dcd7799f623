//! Trained models and their three-part persisted form.
//!
//! A saved model is three named payloads: a topology JSON document, a flat
//! little-endian `f32` weights blob and a metadata JSON document. Metadata is
//! authoritative; the topology payload is informational and only checked for
//! consistency.

mod files;
mod store;

pub use files::{load_from_dir, load_from_paths, save_to_dir};
pub use store::{load, save};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::{GestureClassifier, LabelScore, MinMaxScaling, ModelKind};

/// Number of payloads in a complete artifact.
pub const PAYLOAD_COUNT: usize = 3;
/// Name token that identifies the metadata payload.
pub const METADATA_MARKER: &str = "_meta";
/// Base name used when the caller does not pick one.
pub const DEFAULT_MODEL_NAME: &str = "model";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("insufficient payloads: expected {PAYLOAD_COUNT}, found {found}")]
    InsufficientPayloads { found: usize },
    #[error("metadata missing: no payload name contains '{METADATA_MARKER}'")]
    MetadataMissing,
    #[error("weights missing: no weights payload among {0:?}")]
    WeightsMissing(Vec<String>),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error(
        "dimension mismatch: metadata declares outputDim {output_dim} ({expected} weights), blob holds {found} weights"
    )]
    DimensionMismatch {
        output_dim: usize,
        expected: usize,
        found: usize,
        implied_output_dim: Option<usize>,
    },
    #[error("corrupt weights: {0} bytes is not a whole number of f32 values")]
    CorruptWeights(usize),
    #[error("failed to encode model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("model file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid model name '{0}': must be non-empty without '{METADATA_MARKER}' or 'weights'")]
    InvalidName(String),
    #[error("no model loaded")]
    NoModel,
}

/// Dimensions and labels of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub input_dim: usize,
    pub output_dim: usize,
    /// Labels in classifier output order.
    pub labels: Vec<String>,
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,
    #[serde(default)]
    pub model_kind: ModelKind,
    pub normalization: Option<MinMaxScaling>,
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

fn default_hidden_units() -> usize {
    16
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl ModelMetadata {
    pub fn describe(classifier: &dyn GestureClassifier) -> Self {
        Self {
            input_dim: classifier.input_dim(),
            output_dim: classifier.output_dim(),
            labels: classifier.labels().to_vec(),
            hidden_units: classifier.hidden_units(),
            model_kind: classifier.kind(),
            normalization: Some(classifier.scaling().clone()),
            format_version: FORMAT_VERSION,
        }
    }
}

/// Layer layout written next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub model_kind: ModelKind,
    pub input_dim: usize,
    pub output_dim: usize,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    pub kind: String,
    pub units: usize,
    pub activation: String,
}

impl Topology {
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            model_kind: metadata.model_kind,
            input_dim: metadata.input_dim,
            output_dim: metadata.output_dim,
            layers: vec![
                LayerSpec {
                    kind: "dense".to_string(),
                    units: metadata.hidden_units,
                    activation: "relu".to_string(),
                },
                LayerSpec {
                    kind: "dense".to_string(),
                    units: metadata.output_dim,
                    activation: "softmax".to_string(),
                },
            ],
        }
    }
}

/// Where the current model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Trained,
    Loaded,
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactOrigin::Trained => f.write_str("trained"),
            ArtifactOrigin::Loaded => f.write_str("loaded"),
        }
    }
}

/// An immutable, fully validated classifier plus its metadata.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    version: u64,
    origin: ArtifactOrigin,
    metadata: ModelMetadata,
    classifier: Arc<dyn GestureClassifier>,
}

impl ModelArtifact {
    pub fn new(classifier: Arc<dyn GestureClassifier>, version: u64, origin: ArtifactOrigin) -> Self {
        let metadata = ModelMetadata::describe(classifier.as_ref());
        Self {
            version,
            origin,
            metadata,
            classifier,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn origin(&self) -> ArtifactOrigin {
        self.origin
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn classifier(&self) -> &dyn GestureClassifier {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &[String] {
        &self.metadata.labels
    }

    pub fn classify(&self, features: &[f32]) -> Vec<LabelScore> {
        self.classifier.classify(features)
    }

    pub fn top(&self, features: &[f32]) -> Option<LabelScore> {
        self.classifier.top(features)
    }
}

/// One named, serialized part of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArtifactPayload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// The three payloads produced by [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPayloads {
    pub topology: ArtifactPayload,
    pub weights: ArtifactPayload,
    pub metadata: ArtifactPayload,
}

impl ArtifactPayloads {
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactPayload> {
        [&self.topology, &self.weights, &self.metadata].into_iter()
    }

    pub fn into_vec(self) -> Vec<ArtifactPayload> {
        vec![self.topology, self.weights, self.metadata]
    }
}

//! Hand-gesture training and real-time recognition over hand landmarks.
/// App directory resolution.
pub mod app_dirs;
/// Trained model persistence.
pub mod artifact;
/// Persistent settings.
pub mod config;
/// Labeled samples and training examples.
pub mod dataset;
/// Crate-level error type.
pub mod error;
/// Events emitted to pipeline owners.
pub mod events;
pub(crate) mod fs_atomic;
/// Real-time classification loop.
pub mod inference;
/// Landmark types and the detector feed.
pub mod landmarks;
/// Logging setup.
pub mod logging;
/// Classifier implementations.
pub mod ml;
/// Versioned current-model holder.
pub mod model_slot;
/// Workflow orchestration.
pub mod session;
/// Training runs and progress.
pub mod training;

pub use error::{ErrorCategory, HandsignError};
pub use session::GestureSession;

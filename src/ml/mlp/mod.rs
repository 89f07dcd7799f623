//! Single-hidden-layer dense classifier over landmark feature vectors.

mod model;
mod train;

pub use model::{MlpModel, implied_output_dim, parameter_count};
pub use train::train_mlp;

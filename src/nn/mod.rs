//! Neural network building blocks for the heads.
//!
//! # Modules
//!
//! - [`activation`]: Activation functions selectable from configuration
//! - [`init`]: Weight initialization, including orthogonal schemes
//! - [`dense`]: Fully connected layer with pluggable initialization
//! - [`mlp`]: Configurable feed-forward network
//! - [`cnn_transpose`]: Transposed-convolution stack for image decoding

pub mod activation;
pub mod cnn_transpose;
pub mod dense;
pub mod init;
pub mod mlp;

pub use activation::Activation;
pub use cnn_transpose::{CnnTranspose, CnnTransposeConfig, TransposeLayerSpec};
pub use dense::{Dense, DenseConfig};
pub use init::{orthogonal_weights, WeightInit};
pub use mlp::{Mlp, MlpConfig};

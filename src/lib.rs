//! # RL model heads for Burn
//!
//! Final-stage "head" sub-networks for reinforcement-learning models:
//! policy/value MLP heads with optional log-std clipping, a free
//! (state-independent) log-std variant, and a transposed-CNN head that
//! decodes a feature vector into an image.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      encoder output                          │
//! │                    (batch, features) or                      │
//! │                  (batch, time, features)                     │
//! └───────┬───────────────────┬──────────────────────┬───────────┘
//!         ▼                   ▼                      ▼
//!   ┌───────────┐    ┌─────────────────┐    ┌──────────────────┐
//!   │  MlpHead  │    │ FreeLogStdMlp-  │    │ CnnTransposeHead │
//!   │ logits /  │    │ Head            │    │ dense → deconv   │
//!   │ mean+std  │    │ mean + learned  │    │ stack → image    │
//!   │           │    │ log_std param   │    │ + 0.5 offset     │
//!   └───────────┘    └─────────────────┘    └──────────────────┘
//! ```
//!
//! Heads compute per batch row. Sequence inputs `(batch, time, features)`
//! are served by each head's `forward_seq`, which folds the time axis into
//! the batch axis around the forward pass and unfolds the result, failing
//! with combined diagnostics when neither the original nor the folded shape
//! satisfies the head's input spec.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rl_heads::{MlpHeadConfig, Head};
//!
//! let head = MlpHeadConfig::new(256, 2 * action_dim)
//!     .with_hidden_dims(vec![256])
//!     .with_clip_log_std(true)
//!     .with_log_std_clip_param(20.0)
//!     .init::<B>(&device)?;
//!
//! let logits = head.forward_checked(encoder_out)?;       // (batch, 2 * action_dim)
//! let seq_logits = head.forward_seq(sequence_out)?;      // (batch, time, 2 * action_dim)
//! ```

pub mod error;
pub mod fold;
pub mod heads;
pub mod nn;
pub mod spec;

// Re-export commonly used types
pub use error::HeadBuildError;
pub use fold::{check_batch, fold_time, fold_time_to_image, TimeFoldError};
pub use spec::{AxisSpec, SpecError, TensorSpec};

pub use nn::{
    orthogonal_weights, Activation, CnnTranspose, CnnTransposeConfig, Dense, DenseConfig, Mlp,
    MlpConfig, TransposeLayerSpec, WeightInit,
};

pub use heads::{
    CnnTransposeHead, CnnTransposeHeadConfig, FreeLogStdMlpHead, FreeLogStdMlpHeadConfig, Head,
    MlpHead, MlpHeadConfig,
};

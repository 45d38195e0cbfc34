//! Head networks: final-stage sub-networks mapping a shared representation
//! to a task-specific output.
//!
//! Three heads are provided:
//!
//! - [`MlpHead`]: feed-forward head producing raw logits, or a concatenated
//!   (means, clipped log-stds) pair for Gaussian policies
//! - [`FreeLogStdMlpHead`]: Gaussian policy head whose log-std is a learned
//!   parameter vector, independent of the input
//! - [`CnnTransposeHead`]: decodes a feature vector into an image
//!
//! All heads compute per batch row. The checked entry points validate inputs
//! against the head's declared [`TensorSpec`], and each head carries a
//! `forward_seq` that serves `(batch, time, features)` inputs by folding the
//! time axis through [`crate::fold`].

pub mod cnn_transpose_head;
pub mod free_log_std;
pub mod mlp_head;


pub use cnn_transpose_head::{CnnTransposeHead, CnnTransposeHeadConfig};
pub use free_log_std::{FreeLogStdMlpHead, FreeLogStdMlpHeadConfig};
pub use mlp_head::{MlpHead, MlpHeadConfig};

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::fold::{check_batch, TimeFoldError};
use crate::spec::TensorSpec;

/// Common surface of all heads.
///
/// `Output` is the head's native output tensor: rank 2 for the MLP heads,
/// rank 4 for the image-decoding head.
pub trait Head<B: Backend> {
    /// Native output tensor type of the forward pass.
    type Output;

    /// Shape contract for batch-shaped inputs.
    fn input_spec(&self) -> TensorSpec;

    /// Shape contract for the output of a batch-shaped forward call.
    fn output_spec(&self) -> TensorSpec;

    /// Forward pass on a batch-shaped input. Shape is the caller's
    /// responsibility; use [`Head::forward_checked`] to validate first.
    fn forward(&self, input: Tensor<B, 2>) -> Self::Output;

    /// Validated forward pass: a no-op wrapper around [`Head::forward`] for
    /// inputs matching the input spec, a terminal [`TimeFoldError`] with
    /// full fold diagnostics otherwise.
    fn forward_checked(&self, input: Tensor<B, 2>) -> Result<Self::Output, TimeFoldError> {
        check_batch(&self.input_spec(), &input.dims())?;
        Ok(self.forward(input))
    }
}

//! Fold/unfold of a leading time dimension around batch-only forward passes.
//!
//! Heads compute per-row: their forward pass expects `(batch, features)`.
//! Sequence models hand them `(batch, time, features)` instead. The helpers
//! here adapt between the two by merging the batch and time axes before the
//! wrapped call and splitting them back apart afterwards, so the same head
//! serves both plain and sequential inputs.
//!
//! The recovery is deliberately single-shot: validate, fold once, validate
//! again. If the folded shape still misses the spec, the call fails with a
//! [`TimeFoldError`] carrying both attempted shapes and both underlying
//! validation failures.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::spec::{SpecError, TensorSpec};

/// Terminal shape error from a checked head call.
///
/// Distinct from [`SpecError`]: a `SpecError` on the original shape is the
/// recoverable trigger for the fold attempt, while a `TimeFoldError` means
/// the single recovery transform has already been spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeFoldError {
    /// The shape already satisfies the spec, so there is no leading time
    /// axis to fold. The caller should use the batch entry point.
    AlreadyMatches {
        /// Shape of the offending tensor.
        shape: Vec<usize>,
        /// The spec it was checked against.
        spec: TensorSpec,
    },
    /// The shape satisfies the spec only after merging its two leading axes:
    /// a sequence-shaped tensor was handed to the batch entry point.
    FoldableShape {
        /// Shape of the offending tensor.
        shape: Vec<usize>,
        /// The folded shape that would have been admitted.
        folded: Vec<usize>,
        /// The spec it was checked against.
        spec: TensorSpec,
    },
    /// The shape has fewer than two axes, leaving no leading pair to merge.
    NotFoldable {
        /// Shape of the offending tensor.
        shape: Vec<usize>,
        /// The spec it was checked against.
        spec: TensorSpec,
        /// Validation failure of the shape as given.
        direct: SpecError,
    },
    /// Neither the original shape nor the folded shape satisfies the spec.
    Incompatible {
        /// Shape of the offending tensor.
        shape: Vec<usize>,
        /// Shape after merging the two leading axes.
        folded: Vec<usize>,
        /// The spec both shapes were checked against.
        spec: TensorSpec,
        /// Validation failure of the shape as given.
        direct: SpecError,
        /// Validation failure of the folded shape.
        after_fold: SpecError,
    },
}

impl std::fmt::Display for TimeFoldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFoldError::AlreadyMatches { shape, spec } => write!(
                f,
                "shape {:?} already satisfies {}; there is no time axis to fold",
                shape, spec
            ),
            TimeFoldError::FoldableShape {
                shape,
                folded,
                spec,
            } => write!(
                f,
                "shape {:?} satisfies {} only after folding its leading axes into {:?}; \
                 use the sequence entry point for time-major inputs",
                shape, spec, folded
            ),
            TimeFoldError::NotFoldable {
                shape,
                spec,
                direct,
            } => write!(
                f,
                "shape {:?} does not satisfy {} ({}) and has no leading axis pair to fold",
                shape, spec, direct
            ),
            TimeFoldError::Incompatible {
                shape,
                folded,
                spec,
                direct,
                after_fold,
            } => write!(
                f,
                "shape {:?} does not satisfy {}; folding the time dimension gives {:?}, \
                 which does not satisfy it either. Original error: {}. Error after fold: {}",
                shape, spec, folded, direct, after_fold
            ),
        }
    }
}

impl std::error::Error for TimeFoldError {}

/// Merge the two leading axes of `dims`, if there are at least two.
fn folded_dims(dims: &[usize]) -> Option<Vec<usize>> {
    if dims.len() < 2 {
        return None;
    }
    let mut folded = Vec::with_capacity(dims.len() - 1);
    folded.push(dims[0] * dims[1]);
    folded.extend_from_slice(&dims[2..]);
    Some(folded)
}

/// Validate `dims` against `spec`, with the single fold recovery.
///
/// `Ok(None)`: the shape fits as given. `Ok(Some(folded))`: only the folded
/// shape fits. `Err`: neither does, with both diagnostics attached.
fn try_fold(spec: &TensorSpec, dims: &[usize]) -> Result<Option<Vec<usize>>, TimeFoldError> {
    let direct = match spec.validate(dims) {
        Ok(()) => return Ok(None),
        Err(err) => err,
    };
    let Some(folded) = folded_dims(dims) else {
        return Err(TimeFoldError::NotFoldable {
            shape: dims.to_vec(),
            spec: spec.clone(),
            direct,
        });
    };
    match spec.validate(&folded) {
        Ok(()) => Ok(Some(folded)),
        Err(after_fold) => Err(TimeFoldError::Incompatible {
            shape: dims.to_vec(),
            folded,
            spec: spec.clone(),
            direct,
            after_fold,
        }),
    }
}

/// Validate a batch-shaped input for a direct (no-fold) forward call.
///
/// A shape that matches `spec` passes through untouched, making the checked
/// entry point a no-op wrapper for well-shaped inputs. Anything else fails
/// terminally with the combined fold diagnostics.
pub fn check_batch(spec: &TensorSpec, dims: &[usize]) -> Result<(), TimeFoldError> {
    match try_fold(spec, dims)? {
        None => Ok(()),
        Some(folded) => Err(TimeFoldError::FoldableShape {
            shape: dims.to_vec(),
            folded,
            spec: spec.clone(),
        }),
    }
}

/// Run a `(batch, features) -> (batch, features_out)` forward pass over a
/// `(batch, time, features)` input by folding the time axis into the batch.
///
/// The output keeps the input's batch and time sizes: `[b, t, features_out]`.
pub fn fold_time<B: Backend, F>(
    spec: &TensorSpec,
    input: Tensor<B, 3>,
    f: F,
) -> Result<Tensor<B, 3>, TimeFoldError>
where
    F: FnOnce(Tensor<B, 2>) -> Tensor<B, 2>,
{
    let [batch, time, features] = input.dims();
    match try_fold(spec, &[batch, time, features])? {
        None => Err(TimeFoldError::AlreadyMatches {
            shape: vec![batch, time, features],
            spec: spec.clone(),
        }),
        Some(_) => {
            log::debug!(
                "folding time axis: [{}, {}, {}] -> [{}, {}]",
                batch,
                time,
                features,
                batch * time,
                features
            );
            let out = f(input.reshape([batch * time, features]));
            let [_, features_out] = out.dims();
            Ok(out.reshape([batch, time, features_out]))
        }
    }
}

/// Image-producing variant of [`fold_time`] for heads whose forward pass
/// maps `(batch, features)` to `(batch, w, h, c)`.
///
/// The output unfolds to `[b, t, w, h, c]`.
pub fn fold_time_to_image<B: Backend, F>(
    spec: &TensorSpec,
    input: Tensor<B, 3>,
    f: F,
) -> Result<Tensor<B, 5>, TimeFoldError>
where
    F: FnOnce(Tensor<B, 2>) -> Tensor<B, 4>,
{
    let [batch, time, features] = input.dims();
    match try_fold(spec, &[batch, time, features])? {
        None => Err(TimeFoldError::AlreadyMatches {
            shape: vec![batch, time, features],
            spec: spec.clone(),
        }),
        Some(_) => {
            let out = f(input.reshape([batch * time, features]));
            let [_, width, height, channels] = out.dims();
            Ok(out.reshape([batch, time, width, height, channels]))
        }
    }
}

//! Declarative shape contracts for head inputs and outputs.
//!
//! A [`TensorSpec`] describes the shape a tensor must have to enter or leave
//! a head: a fixed rank, with each axis either open-ended (the batch axis) or
//! pinned to an exact size. Validation failures are the *recoverable* tier of
//! the shape-error hierarchy: the fold logic in [`crate::fold`] reacts to a
//! [`SpecError`] by merging a leading time axis and validating once more.

/// Contract for a single tensor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSpec {
    /// Any size is admitted. Used for the batch axis.
    Any(&'static str),
    /// The axis must have exactly this size.
    Exact(&'static str, usize),
}

/// Shape contract a tensor must satisfy.
///
/// Equivalent in spirit to a `(batch, feature)` or `(batch, w, h, c)`
/// annotation: rank is fixed, sized axes are checked exactly, `Any` axes
/// admit any size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    axes: Vec<AxisSpec>,
}

impl TensorSpec {
    /// Create a spec from explicit axis contracts.
    pub fn new(axes: Vec<AxisSpec>) -> Self {
        Self { axes }
    }

    /// `(b, d)`: a batch of feature vectors with `features` columns.
    pub fn batch_features(features: usize) -> Self {
        Self::new(vec![AxisSpec::Any("b"), AxisSpec::Exact("d", features)])
    }

    /// `(b, w, h, c)`: a batch of channels-last images.
    pub fn batch_image(width: usize, height: usize, channels: usize) -> Self {
        Self::new(vec![
            AxisSpec::Any("b"),
            AxisSpec::Exact("w", width),
            AxisSpec::Exact("h", height),
            AxisSpec::Exact("c", channels),
        ])
    }

    /// Number of axes this spec requires.
    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// The axis contracts, in order.
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    /// Check `dims` against this spec: rank first, then each sized axis.
    pub fn validate(&self, dims: &[usize]) -> Result<(), SpecError> {
        if dims.len() != self.axes.len() {
            return Err(SpecError::RankMismatch {
                expected: self.axes.len(),
                shape: dims.to_vec(),
            });
        }
        for (axis, (spec, &actual)) in self.axes.iter().zip(dims.iter()).enumerate() {
            if let AxisSpec::Exact(label, expected) = spec {
                if actual != *expected {
                    return Err(SpecError::AxisMismatch {
                        label,
                        axis,
                        expected: *expected,
                        actual,
                        shape: dims.to_vec(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match axis {
                AxisSpec::Any(label) => write!(f, "{}", label)?,
                AxisSpec::Exact(label, size) => write!(f, "{}={}", label, size)?,
            }
        }
        write!(f, ")")
    }
}

/// Validation failure for a single shape against a single spec.
///
/// This is the recoverable tier: callers holding a tensor with a possible
/// leading time axis respond by folding it into the batch axis and
/// validating again (see [`crate::fold`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The tensor has the wrong number of axes.
    RankMismatch {
        /// Rank the spec requires.
        expected: usize,
        /// Actual shape of the offending tensor.
        shape: Vec<usize>,
    },
    /// An axis with a pinned size has the wrong size.
    AxisMismatch {
        /// Label of the violated axis.
        label: &'static str,
        /// Index of the violated axis.
        axis: usize,
        /// Size the spec requires.
        expected: usize,
        /// Actual size of that axis.
        actual: usize,
        /// Actual shape of the offending tensor.
        shape: Vec<usize>,
    },
}

impl std::fmt::Display for SpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecError::RankMismatch { expected, shape } => write!(
                f,
                "rank mismatch: spec requires {} axes but shape {:?} has {}",
                expected,
                shape,
                shape.len()
            ),
            SpecError::AxisMismatch {
                label,
                axis,
                expected,
                actual,
                shape,
            } => write!(
                f,
                "axis {} ({}) must have size {} but shape {:?} has {}",
                axis, label, expected, shape, actual
            ),
        }
    }
}

impl std::error::Error for SpecError {}

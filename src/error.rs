//! Construction-time errors for head configs.
//!
//! Bad configuration surfaces here, from `Config::init`, never during a
//! forward pass. Shape errors raised at forward time live in [`crate::spec`]
//! and [`crate::fold`].

/// Error type for building heads and layer primitives from their configs.
#[derive(Debug)]
pub enum HeadBuildError {
    /// The head splits its output evenly into means and log-stds, which is
    /// impossible for an odd output dimension.
    OddOutputDim {
        /// The offending output dimension.
        output_dim: usize,
    },
    /// Activation name not present in the lookup table.
    UnknownActivation {
        /// The name that failed to resolve.
        name: String,
    },
    /// Initializer name not present in the lookup table.
    UnknownInitializer {
        /// The name that failed to resolve.
        name: String,
    },
    /// A transposed-convolution head needs at least one layer in its stack.
    EmptyTransposeStack,
    /// Initial image dimensions must all be non-zero.
    ZeroImageDim {
        /// The configured (width, height, filters) triple.
        dims: [usize; 3],
    },
}

impl std::fmt::Display for HeadBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadBuildError::OddOutputDim { output_dim } => write!(
                f,
                "output dimension {} cannot be split evenly into means and log-stds",
                output_dim
            ),
            HeadBuildError::UnknownActivation { name } => {
                write!(f, "unknown activation name: {:?}", name)
            }
            HeadBuildError::UnknownInitializer { name } => {
                write!(f, "unknown initializer name: {:?}", name)
            }
            HeadBuildError::EmptyTransposeStack => {
                write!(f, "transposed-convolution stack has no layers")
            }
            HeadBuildError::ZeroImageDim { dims } => write!(
                f,
                "initial image dimensions {:?} contain a zero-sized axis",
                dims
            ),
        }
    }
}

impl std::error::Error for HeadBuildError {}

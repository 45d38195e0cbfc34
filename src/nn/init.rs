//! Weight initialization for head layers.
//!
//! Wraps Burn's [`Initializer`] and adds orthogonal initialization, which
//! Burn does not ship but RL heads lean on heavily: policy output layers are
//! typically initialized orthogonally with a small gain so the initial policy
//! stays near-uniform, and hidden layers with gain sqrt(2) for ReLU.
//!
//! Orthogonal weights are produced by Gram-Schmidt since Burn has no QR
//! decomposition.

use burn::module::Param;
use burn::nn::Initializer;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, ElementConversion, Tensor};

use crate::error::HeadBuildError;

/// Initialization scheme for a weight or bias tensor.
#[derive(Debug, Clone)]
pub enum WeightInit {
    /// One of Burn's built-in initializers.
    Standard(Initializer),
    /// Orthogonal rows/columns scaled by `gain`.
    ///
    /// Common gains: 1.0 for linear outputs, sqrt(2) for ReLU hidden layers,
    /// small values like 0.01 for policy output layers.
    Orthogonal {
        /// Scale applied to the orthogonal matrix.
        gain: f64,
    },
}

impl Default for WeightInit {
    fn default() -> Self {
        // Burn's Linear default: Kaiming-uniform with gain 1/sqrt(3).
        WeightInit::Standard(Initializer::KaimingUniform {
            gain: 1.0 / 3.0f64.sqrt(),
            fan_out_only: false,
        })
    }
}

impl WeightInit {
    /// All-zeros. The conventional bias initialization.
    pub fn zeros() -> Self {
        WeightInit::Standard(Initializer::Zeros)
    }

    /// Every element set to `value`.
    pub fn constant(value: f64) -> Self {
        WeightInit::Standard(Initializer::Constant { value })
    }

    /// Orthogonal with the given gain.
    pub fn orthogonal(gain: f64) -> Self {
        WeightInit::Orthogonal { gain }
    }

    /// Resolve an initializer by name, as string-typed model configs express
    /// them. Keras-style aliases (`glorot_*`, `he_*`) are accepted.
    pub fn from_name(name: &str) -> Result<Self, HeadBuildError> {
        let init = match name {
            "zeros" => Initializer::Zeros,
            "ones" => Initializer::Ones,
            "normal" => Initializer::Normal {
                mean: 0.0,
                std: 1.0,
            },
            "uniform" => Initializer::Uniform {
                min: -1.0,
                max: 1.0,
            },
            "xavier_uniform" | "glorot_uniform" => Initializer::XavierUniform { gain: 1.0 },
            "xavier_normal" | "glorot_normal" => Initializer::XavierNormal { gain: 1.0 },
            "kaiming_uniform" | "he_uniform" => Initializer::KaimingUniform {
                gain: 1.0,
                fan_out_only: false,
            },
            "kaiming_normal" | "he_normal" => Initializer::KaimingNormal {
                gain: 1.0,
                fan_out_only: false,
            },
            "orthogonal" => return Ok(WeightInit::Orthogonal { gain: 1.0 }),
            _ => {
                return Err(HeadBuildError::UnknownInitializer {
                    name: name.to_string(),
                })
            }
        };
        Ok(WeightInit::Standard(init))
    }

    /// Initialize a dense weight matrix of shape `[d_output, d_input]`.
    pub fn init_dense_weight<B: Backend>(
        &self,
        d_output: usize,
        d_input: usize,
        device: &B::Device,
    ) -> Param<Tensor<B, 2>> {
        match self {
            WeightInit::Standard(init) => {
                init.init_with([d_output, d_input], Some(d_input), Some(d_output), device)
            }
            WeightInit::Orthogonal { gain } => {
                Param::from_tensor(orthogonal_weights::<B>(d_output, d_input, *gain, device))
            }
        }
    }

    /// Initialize a bias vector of length `d_output`.
    ///
    /// Orthogonality is meaningless for a vector, so that variant falls back
    /// to zeros.
    pub fn init_bias<B: Backend>(
        &self,
        d_output: usize,
        fan_in: usize,
        device: &B::Device,
    ) -> Param<Tensor<B, 1>> {
        match self {
            WeightInit::Standard(init) => {
                init.init_with([d_output], Some(fan_in), Some(d_output), device)
            }
            WeightInit::Orthogonal { .. } => Param::from_tensor(Tensor::zeros([d_output], device)),
        }
    }

    /// Initialize a transposed-convolution kernel of shape
    /// `[channels_in, channels_out, k_h, k_w]`.
    ///
    /// The orthogonal variant treats the kernel as a
    /// `[channels_in, channels_out * k_h * k_w]` matrix, orthogonalizes it,
    /// and reshapes back.
    pub fn init_conv_transpose_kernel<B: Backend>(
        &self,
        shape: [usize; 4],
        device: &B::Device,
    ) -> Param<Tensor<B, 4>> {
        let [channels_in, channels_out, k_h, k_w] = shape;
        let fan_in = channels_in * k_h * k_w;
        let fan_out = channels_out * k_h * k_w;
        match self {
            WeightInit::Standard(init) => {
                init.init_with(shape, Some(fan_in), Some(fan_out), device)
            }
            WeightInit::Orthogonal { gain } => {
                let flat = orthogonal_weights::<B>(channels_in, fan_out, *gain, device);
                Param::from_tensor(flat.reshape(shape))
            }
        }
    }
}

/// Generate an orthogonal matrix of shape `[rows, cols]`, scaled by `gain`.
///
/// Orthogonalizes the longer side: columns for tall matrices, rows for wide
/// ones, so the result always has orthonormal vectors along its shorter
/// dimension.
pub fn orthogonal_weights<B: Backend>(
    rows: usize,
    cols: usize,
    gain: f64,
    device: &B::Device,
) -> Tensor<B, 2> {
    let random = Tensor::<B, 2>::random([rows, cols], Distribution::Normal(0.0, 1.0), device);

    let orthogonal = if rows >= cols {
        gram_schmidt_columns::<B>(random, device)
    } else {
        gram_schmidt_columns::<B>(random.transpose(), device).transpose()
    };

    orthogonal * (gain as f32)
}

/// Gram-Schmidt orthonormalization of matrix columns.
fn gram_schmidt_columns<B: Backend>(matrix: Tensor<B, 2>, device: &B::Device) -> Tensor<B, 2> {
    let [rows, cols] = matrix.dims();

    let mut columns: Vec<Tensor<B, 1>> = (0..cols)
        .map(|i| matrix.clone().slice([0..rows, i..i + 1]).squeeze::<1>())
        .collect();

    for i in 0..cols {
        let mut v = columns[i].clone();

        // Remove the projection onto each already-orthonormal column.
        for prev in columns.iter().take(i) {
            let along = dot::<B>(&v, prev) / (dot::<B>(prev, prev) + 1e-10);
            v = v - prev.clone() * along;
        }

        let norm: f32 = v.clone().powf_scalar(2.0).sum().sqrt().into_scalar().elem();
        columns[i] = if norm > 1e-10 {
            v / norm
        } else {
            // Linearly dependent column: replace with a fresh unit vector.
            let fresh: Tensor<B, 1> = Tensor::random([rows], Distribution::Normal(0.0, 1.0), device);
            let fresh_norm: f32 = fresh
                .clone()
                .powf_scalar(2.0)
                .sum()
                .sqrt()
                .into_scalar()
                .elem();
            fresh / fresh_norm
        };
    }

    let stacked: Vec<Tensor<B, 2>> = columns.into_iter().map(|c| c.unsqueeze_dim(1)).collect();
    Tensor::cat(stacked, 1)
}

fn dot<B: Backend>(a: &Tensor<B, 1>, b: &Tensor<B, 1>) -> f32 {
    (a.clone() * b.clone()).sum().into_scalar().elem()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    fn device() -> <B as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_from_name() {
        assert!(matches!(
            WeightInit::from_name("glorot_uniform").unwrap(),
            WeightInit::Standard(Initializer::XavierUniform { .. })
        ));
        assert!(matches!(
            WeightInit::from_name("orthogonal").unwrap(),
            WeightInit::Orthogonal { .. }
        ));
        assert!(WeightInit::from_name("lecun_sideways").is_err());
    }

    #[test]
    fn test_constant_dense_weight() {
        let dev = device();
        let weight = WeightInit::constant(0.25).init_dense_weight::<B>(3, 4, &dev);
        let data = weight.val().into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert!(values.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_orthogonal_square_is_orthonormal() {
        let dev = device();
        let weights = orthogonal_weights::<B>(4, 4, 1.0, &dev);
        let product = weights.clone().matmul(weights.transpose());
        let identity = Tensor::<B, 2>::eye(4, &dev);
        let diff = (product - identity).abs().mean().into_scalar();
        assert!(diff < 0.1);
    }

    #[test]
    fn test_orthogonal_wide_rows_orthonormal() {
        let dev = device();
        let weights = orthogonal_weights::<B>(3, 8, 1.0, &dev);
        assert_eq!(weights.dims(), [3, 8]);
        let product = weights.clone().matmul(weights.transpose());
        let identity = Tensor::<B, 2>::eye(3, &dev);
        let diff = (product - identity).abs().mean().into_scalar();
        assert!(diff < 0.1);
    }

    #[test]
    fn test_orthogonal_gain_scales() {
        let dev = device();
        let g1 = orthogonal_weights::<B>(4, 4, 1.0, &dev);
        let g2 = orthogonal_weights::<B>(4, 4, 2.0, &dev);
        let mean1: f32 = g1.abs().mean().into_scalar();
        let mean2: f32 = g2.abs().mean().into_scalar();
        assert!(mean2 > mean1 * 1.5);
    }

    #[test]
    fn test_orthogonal_bias_falls_back_to_zeros() {
        let dev = device();
        let bias = WeightInit::orthogonal(2.0).init_bias::<B>(5, 16, &dev);
        let data = bias.val().into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_conv_transpose_kernel_shape() {
        let dev = device();
        let kernel =
            WeightInit::orthogonal(1.0).init_conv_transpose_kernel::<B>([8, 3, 4, 4], &dev);
        assert_eq!(kernel.val().dims(), [8, 3, 4, 4]);
    }
}

//! Activation functions selectable from configuration.

use burn::tensor::activation::{gelu, relu, sigmoid, silu, tanh};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::HeadBuildError;

/// Activation applied between or after layers.
///
/// `Linear` is the identity and is the right choice for output layers whose
/// raw values feed a distribution or a reconstruction loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Identity.
    Linear,
    /// Rectified linear unit.
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// Logistic sigmoid.
    Sigmoid,
    /// Sigmoid-weighted linear unit (a.k.a. swish).
    Silu,
    /// Gaussian error linear unit.
    Gelu,
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Relu
    }
}

impl Activation {
    /// Resolve an activation by name, as string-typed model configs express
    /// them. An empty name or `"linear"` is the identity.
    pub fn from_name(name: &str) -> Result<Self, HeadBuildError> {
        match name {
            "" | "linear" => Ok(Activation::Linear),
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "silu" | "swish" => Ok(Activation::Silu),
            "gelu" => Ok(Activation::Gelu),
            _ => Err(HeadBuildError::UnknownActivation {
                name: name.to_string(),
            }),
        }
    }

    /// Apply the activation element-wise.
    pub fn apply<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Linear => input,
            Activation::Relu => relu(input),
            Activation::Tanh => tanh(input),
            Activation::Sigmoid => sigmoid(input),
            Activation::Silu => silu(input),
            Activation::Gelu => gelu(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_from_name() {
        assert_eq!(Activation::from_name("relu").unwrap(), Activation::Relu);
        assert_eq!(Activation::from_name("swish").unwrap(), Activation::Silu);
        assert_eq!(Activation::from_name("").unwrap(), Activation::Linear);
        assert!(Activation::from_name("step").is_err());
    }

    #[test]
    fn test_linear_is_identity() {
        let device = Default::default();
        let input: Tensor<B, 2> = Tensor::from_floats([[-2.0, 0.0, 3.0]], &device);
        let out = Activation::Linear.apply(input.clone());
        let diff = (out - input).abs().max().into_scalar();
        assert!(diff < 1e-9);
    }

    #[test]
    fn test_relu_clamps_negative() {
        let device = Default::default();
        let input: Tensor<B, 2> = Tensor::from_floats([[-2.0, 0.5]], &device);
        let data = Activation::Relu.apply(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert_eq!(values, &[0.0, 0.5]);
    }
}

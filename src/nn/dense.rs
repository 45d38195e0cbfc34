//! Fully connected layer with pluggable weight initialization.
//!
//! Functionally equivalent to Burn's `Linear`, but parameterized over
//! [`WeightInit`] so heads can request orthogonal or constant schemes per
//! layer from configuration.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::init::WeightInit;

/// Configuration for a [`Dense`] layer.
#[derive(Debug, Clone)]
pub struct DenseConfig {
    /// Number of input features.
    pub d_input: usize,
    /// Number of output features.
    pub d_output: usize,
    /// Whether to include a bias term.
    pub bias: bool,
    /// Weight initialization scheme.
    pub weight_init: WeightInit,
    /// Bias initialization scheme.
    pub bias_init: WeightInit,
}

impl DenseConfig {
    /// Create a new configuration with bias enabled and default inits.
    pub fn new(d_input: usize, d_output: usize) -> Self {
        Self {
            d_input,
            d_output,
            bias: true,
            weight_init: WeightInit::default(),
            bias_init: WeightInit::zeros(),
        }
    }

    /// Set whether to include a bias term.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set the weight initialization scheme.
    pub fn with_weight_init(mut self, weight_init: WeightInit) -> Self {
        self.weight_init = weight_init;
        self
    }

    /// Set the bias initialization scheme.
    pub fn with_bias_init(mut self, bias_init: WeightInit) -> Self {
        self.bias_init = bias_init;
        self
    }

    /// Initialize the layer.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Dense<B> {
        let weight = self
            .weight_init
            .init_dense_weight(self.d_output, self.d_input, device);
        let bias = if self.bias {
            Some(self.bias_init.init_bias(self.d_output, self.d_input, device))
        } else {
            None
        };

        Dense {
            weight,
            bias,
            d_input: self.d_input,
            d_output: self.d_output,
        }
    }
}

/// Fully connected layer: `y = x Wᵀ + b`.
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    /// Weight matrix of shape [d_output, d_input].
    pub weight: Param<Tensor<B, 2>>,
    /// Optional bias of shape [d_output].
    pub bias: Option<Param<Tensor<B, 1>>>,
    d_input: usize,
    d_output: usize,
}

impl<B: Backend> Dense<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `input` - Tensor of shape [batch_size, d_input]
    ///
    /// # Returns
    /// Tensor of shape [batch_size, d_output]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let output = input.matmul(self.weight.val().transpose());
        match &self.bias {
            Some(bias) => output + bias.val().unsqueeze_dim(0),
            None => output,
        }
    }

    /// Input dimension.
    pub fn d_input(&self) -> usize {
        self.d_input
    }

    /// Output dimension.
    pub fn d_output(&self) -> usize {
        self.d_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let dense: Dense<B> = DenseConfig::new(4, 3).init(&device);

        let input = Tensor::random([2, 4], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(dense.forward(input).dims(), [2, 3]);
    }

    #[test]
    fn test_no_bias() {
        let device = Default::default();
        let dense: Dense<B> = DenseConfig::new(4, 3).with_bias(false).init(&device);
        assert!(dense.bias.is_none());
    }

    #[test]
    fn test_constant_weights_known_output() {
        let device = Default::default();
        let dense: Dense<B> = DenseConfig::new(4, 2)
            .with_weight_init(WeightInit::constant(1.0))
            .init(&device);

        // Ones weights, zero bias: each output is the input row sum.
        let input: Tensor<B, 2> = Tensor::from_floats([[1.0, 2.0, 3.0, 4.0]], &device);
        let data = dense.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert_eq!(values, &[10.0, 10.0]);
    }
}

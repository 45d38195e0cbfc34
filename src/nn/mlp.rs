//! Configurable feed-forward network.
//!
//! A stack of [`Dense`] hidden layers with a shared activation, optional
//! layer normalization, and a separately configured output layer. This is the
//! body shared by the MLP-based heads.

use burn::module::{Ignored, Module};
use burn::nn::{LayerNorm, LayerNormConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::activation::Activation;
use super::dense::{Dense, DenseConfig};
use super::init::WeightInit;

/// Configuration for an [`Mlp`].
#[derive(Debug, Clone)]
pub struct MlpConfig {
    /// Number of input features.
    pub input_dim: usize,
    /// Widths of the hidden layers, in order. May be empty.
    pub hidden_dims: Vec<usize>,
    /// Activation shared by all hidden layers.
    pub hidden_activation: Activation,
    /// Whether to layer-normalize each hidden layer before its activation.
    pub hidden_layer_norm: bool,
    /// Whether hidden layers carry a bias term.
    pub hidden_bias: bool,
    /// Weight initialization for hidden layers.
    pub hidden_weight_init: WeightInit,
    /// Bias initialization for hidden layers.
    pub hidden_bias_init: WeightInit,
    /// Number of output features.
    pub output_dim: usize,
    /// Activation of the output layer.
    pub output_activation: Activation,
    /// Whether the output layer carries a bias term.
    pub output_bias: bool,
    /// Weight initialization for the output layer.
    pub output_weight_init: WeightInit,
    /// Bias initialization for the output layer.
    pub output_bias_init: WeightInit,
}

impl MlpConfig {
    /// Create a configuration with no hidden layers, ReLU hidden activation
    /// and a linear, biased output layer.
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dims: Vec::new(),
            hidden_activation: Activation::default(),
            hidden_layer_norm: false,
            hidden_bias: true,
            hidden_weight_init: WeightInit::default(),
            hidden_bias_init: WeightInit::zeros(),
            output_dim,
            output_activation: Activation::Linear,
            output_bias: true,
            output_weight_init: WeightInit::default(),
            output_bias_init: WeightInit::zeros(),
        }
    }

    /// Set the hidden layer widths.
    pub fn with_hidden_dims(mut self, hidden_dims: Vec<usize>) -> Self {
        self.hidden_dims = hidden_dims;
        self
    }

    /// Set the hidden activation.
    pub fn with_hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden_activation = activation;
        self
    }

    /// Enable or disable layer normalization on hidden layers.
    pub fn with_hidden_layer_norm(mut self, layer_norm: bool) -> Self {
        self.hidden_layer_norm = layer_norm;
        self
    }

    /// Set whether hidden layers carry a bias.
    pub fn with_hidden_bias(mut self, bias: bool) -> Self {
        self.hidden_bias = bias;
        self
    }

    /// Set the hidden weight initialization.
    pub fn with_hidden_weight_init(mut self, init: WeightInit) -> Self {
        self.hidden_weight_init = init;
        self
    }

    /// Set the hidden bias initialization.
    pub fn with_hidden_bias_init(mut self, init: WeightInit) -> Self {
        self.hidden_bias_init = init;
        self
    }

    /// Set the output activation.
    pub fn with_output_activation(mut self, activation: Activation) -> Self {
        self.output_activation = activation;
        self
    }

    /// Set whether the output layer carries a bias.
    pub fn with_output_bias(mut self, bias: bool) -> Self {
        self.output_bias = bias;
        self
    }

    /// Set the output weight initialization.
    pub fn with_output_weight_init(mut self, init: WeightInit) -> Self {
        self.output_weight_init = init;
        self
    }

    /// Set the output bias initialization.
    pub fn with_output_bias_init(mut self, init: WeightInit) -> Self {
        self.output_bias_init = init;
        self
    }

    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut hidden = Vec::with_capacity(self.hidden_dims.len());
        let mut norms = Vec::new();

        let mut d_in = self.input_dim;
        for &width in &self.hidden_dims {
            // The norm's learned offset replaces the bias.
            let bias = self.hidden_bias && !self.hidden_layer_norm;
            hidden.push(
                DenseConfig::new(d_in, width)
                    .with_bias(bias)
                    .with_weight_init(self.hidden_weight_init.clone())
                    .with_bias_init(self.hidden_bias_init.clone())
                    .init(device),
            );
            if self.hidden_layer_norm {
                norms.push(LayerNormConfig::new(width).init(device));
            }
            d_in = width;
        }

        let output = DenseConfig::new(d_in, self.output_dim)
            .with_bias(self.output_bias)
            .with_weight_init(self.output_weight_init.clone())
            .with_bias_init(self.output_bias_init.clone())
            .init(device);

        Mlp {
            hidden,
            norms,
            output,
            hidden_activation: Ignored(self.hidden_activation),
            output_activation: Ignored(self.output_activation),
        }
    }
}

/// Feed-forward network of dense layers.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden: Vec<Dense<B>>,
    norms: Vec<LayerNorm<B>>,
    output: Dense<B>,
    hidden_activation: Ignored<Activation>,
    output_activation: Ignored<Activation>,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `input` - Tensor of shape [batch_size, input_dim]
    ///
    /// # Returns
    /// Tensor of shape [batch_size, output_dim]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = input;
        for (i, layer) in self.hidden.iter().enumerate() {
            x = layer.forward(x);
            if let Some(norm) = self.norms.get(i) {
                x = norm.forward(x);
            }
            x = self.hidden_activation.0.apply(x);
        }
        self.output_activation.0.apply(self.output.forward(x))
    }

    /// Input dimension.
    pub fn input_dim(&self) -> usize {
        self.hidden
            .first()
            .map(Dense::d_input)
            .unwrap_or_else(|| self.output.d_input())
    }

    /// Output dimension.
    pub fn output_dim(&self) -> usize {
        self.output.d_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn test_forward_shape_with_hidden_layers() {
        let device = Default::default();
        let mlp: Mlp<B> = MlpConfig::new(8, 4)
            .with_hidden_dims(vec![16, 16])
            .init(&device);

        let input = Tensor::random([3, 8], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(mlp.forward(input).dims(), [3, 4]);
        assert_eq!(mlp.input_dim(), 8);
        assert_eq!(mlp.output_dim(), 4);
    }

    #[test]
    fn test_no_hidden_layers_is_single_dense() {
        let device = Default::default();
        let mlp: Mlp<B> = MlpConfig::new(5, 2).init(&device);

        let input = Tensor::random([4, 5], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(mlp.forward(input).dims(), [4, 2]);
        assert_eq!(mlp.input_dim(), 5);
    }

    #[test]
    fn test_layer_norm_drops_hidden_bias() {
        let device = Default::default();
        let mlp: Mlp<B> = MlpConfig::new(8, 4)
            .with_hidden_dims(vec![16])
            .with_hidden_layer_norm(true)
            .init(&device);

        assert!(mlp.hidden[0].bias.is_none());
        assert_eq!(mlp.norms.len(), 1);

        let input = Tensor::random([3, 8], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(mlp.forward(input).dims(), [3, 4]);
    }

    #[test]
    fn test_constant_network_known_output() {
        let device = Default::default();
        // Ones everywhere, linear output: y = sum of inputs per output unit.
        let mlp: Mlp<B> = MlpConfig::new(3, 2)
            .with_output_weight_init(WeightInit::constant(1.0))
            .init(&device);

        let input: Tensor<B, 2> = Tensor::from_floats([[1.0, 2.0, 3.0]], &device);
        let data = mlp.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert_eq!(values, &[6.0, 6.0]);
    }
}

//! Transposed-convolution stack for image decoding.
//!
//! Upsamples an initial small image to a full-resolution output, one
//! transposed-convolution layer at a time. Padding is chosen "same"-style so
//! each layer scales width and height by exactly its stride, which keeps the
//! final output dimensions a simple function of the configuration.
//!
//! The last layer is never activated or normalized: it produces the raw
//! decoded image that the owning head post-processes.

use burn::module::{Ignored, Module};
use burn::nn::conv::{ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{LayerNorm, LayerNormConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::activation::Activation;
use super::init::WeightInit;

/// One layer of the transpose stack: filter count, square kernel size, and
/// stride (the upsampling factor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransposeLayerSpec {
    /// Number of output channels.
    pub filters: usize,
    /// Side length of the square kernel.
    pub kernel: usize,
    /// Stride; each spatial dimension grows by this factor.
    pub stride: usize,
}

impl TransposeLayerSpec {
    /// Create a layer spec.
    pub fn new(filters: usize, kernel: usize, stride: usize) -> Self {
        Self {
            filters,
            kernel,
            stride,
        }
    }
}

/// Padding and output-padding that make a transposed convolution produce
/// exactly `input * stride` along each spatial dimension:
/// `out = (in - 1) * stride - 2 * padding + kernel + output_padding`.
fn same_padding(kernel: usize, stride: usize) -> (usize, usize) {
    let padding = kernel.saturating_sub(stride).div_ceil(2);
    let output_padding = (stride + 2 * padding).saturating_sub(kernel);
    (padding, output_padding)
}

/// Configuration for a [`CnnTranspose`] stack.
#[derive(Debug, Clone)]
pub struct CnnTransposeConfig {
    /// Input image dimensions as (width, height, channels).
    pub input_dims: [usize; 3],
    /// The transpose layers, applied in order.
    pub layers: Vec<TransposeLayerSpec>,
    /// Activation applied after every layer except the last.
    pub activation: Activation,
    /// Whether to layer-normalize channels after every layer except the last.
    pub layer_norm: bool,
    /// Whether the convolution layers carry bias terms.
    pub bias: bool,
    /// Kernel weight initialization.
    pub kernel_init: WeightInit,
    /// Bias initialization.
    pub bias_init: WeightInit,
}

impl CnnTransposeConfig {
    /// Create a configuration with ReLU activations and biased layers.
    pub fn new(input_dims: [usize; 3], layers: Vec<TransposeLayerSpec>) -> Self {
        Self {
            input_dims,
            layers,
            activation: Activation::default(),
            layer_norm: false,
            bias: true,
            kernel_init: WeightInit::default(),
            bias_init: WeightInit::zeros(),
        }
    }

    /// Set the activation.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Enable or disable layer normalization.
    pub fn with_layer_norm(mut self, layer_norm: bool) -> Self {
        self.layer_norm = layer_norm;
        self
    }

    /// Set whether layers carry bias terms.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set the kernel weight initialization.
    pub fn with_kernel_init(mut self, init: WeightInit) -> Self {
        self.kernel_init = init;
        self
    }

    /// Set the bias initialization.
    pub fn with_bias_init(mut self, init: WeightInit) -> Self {
        self.bias_init = init;
        self
    }

    /// Output image dimensions as (width, height, channels).
    pub fn output_dims(&self) -> [usize; 3] {
        let [mut width, mut height, mut channels] = self.input_dims;
        for layer in &self.layers {
            width *= layer.stride;
            height *= layer.stride;
            channels = layer.filters;
        }
        [width, height, channels]
    }

    /// Initialize the stack.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CnnTranspose<B> {
        let mut layers = Vec::with_capacity(self.layers.len());
        let mut norms = Vec::new();

        let mut channels_in = self.input_dims[2];
        for (i, spec) in self.layers.iter().enumerate() {
            let (padding, output_padding) = same_padding(spec.kernel, spec.stride);
            let config = ConvTranspose2dConfig::new(
                [channels_in, spec.filters],
                [spec.kernel, spec.kernel],
            )
            .with_stride([spec.stride, spec.stride])
            .with_padding([padding, padding])
            .with_padding_out([output_padding, output_padding])
            .with_bias(self.bias);

            let mut conv = match &self.kernel_init {
                WeightInit::Standard(init) => config.with_initializer(init.clone()).init(device),
                WeightInit::Orthogonal { .. } => {
                    let mut conv = config.init(device);
                    conv.weight = self.kernel_init.init_conv_transpose_kernel(
                        [channels_in, spec.filters, spec.kernel, spec.kernel],
                        device,
                    );
                    conv
                }
            };
            if self.bias {
                let fan_in = channels_in * spec.kernel * spec.kernel;
                conv.bias = Some(self.bias_init.init_bias(spec.filters, fan_in, device));
            }
            layers.push(conv);

            let is_last = i + 1 == self.layers.len();
            if self.layer_norm && !is_last {
                norms.push(LayerNormConfig::new(spec.filters).init(device));
            }
            channels_in = spec.filters;
        }

        CnnTranspose {
            layers,
            norms,
            activation: Ignored(self.activation),
        }
    }
}

/// Stack of transposed-convolution layers, operating in NCHW layout.
#[derive(Module, Debug)]
pub struct CnnTranspose<B: Backend> {
    layers: Vec<ConvTranspose2d<B>>,
    norms: Vec<LayerNorm<B>>,
    activation: Ignored<Activation>,
}

impl<B: Backend> CnnTranspose<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `input` - Tensor of shape [batch, channels, height, width]
    ///
    /// # Returns
    /// Tensor of shape [batch, channels_out, height_out, width_out]
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = input;
        for (i, conv) in self.layers.iter().enumerate() {
            x = conv.forward(x);
            if i == last {
                break;
            }
            if let Some(norm) = self.norms.get(i) {
                // LayerNorm normalizes the trailing axis; move channels
                // there and back.
                x = norm.forward(x.permute([0, 2, 3, 1])).permute([0, 3, 1, 2]);
            }
            x = self.activation.0.apply(x);
        }
        x
    }
}

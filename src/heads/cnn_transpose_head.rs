//! Image-decoding head: dense projection plus transposed-convolution stack.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::Head;
use crate::error::HeadBuildError;
use crate::fold::{fold_time_to_image, TimeFoldError};
use crate::nn::{
    Activation, CnnTranspose, CnnTransposeConfig, Dense, DenseConfig, TransposeLayerSpec,
    WeightInit,
};
use crate::spec::TensorSpec;

/// Configuration for a [`CnnTransposeHead`].
#[derive(Debug, Clone)]
pub struct CnnTransposeHeadConfig {
    /// Number of input features.
    pub input_dim: usize,
    /// Initial image produced by the dense projection, as
    /// (width, height, filters).
    pub initial_image_dims: [usize; 3],
    /// Weight initialization for the initial dense projection.
    pub initial_dense_weight_init: WeightInit,
    /// Bias initialization for the initial dense projection.
    pub initial_dense_bias_init: WeightInit,
    /// The transpose layers, applied in order.
    pub layers: Vec<TransposeLayerSpec>,
    /// Activation after every transpose layer except the last.
    pub activation: Activation,
    /// Whether to layer-normalize between transpose layers.
    pub layer_norm: bool,
    /// Whether the transpose layers carry bias terms.
    pub bias: bool,
    /// Kernel weight initialization for the transpose layers.
    pub kernel_init: WeightInit,
    /// Bias initialization for the transpose layers.
    pub bias_init: WeightInit,
}

impl CnnTransposeHeadConfig {
    /// Create a configuration.
    pub fn new(
        input_dim: usize,
        initial_image_dims: [usize; 3],
        layers: Vec<TransposeLayerSpec>,
    ) -> Self {
        Self {
            input_dim,
            initial_image_dims,
            initial_dense_weight_init: WeightInit::default(),
            initial_dense_bias_init: WeightInit::zeros(),
            layers,
            activation: Activation::default(),
            layer_norm: false,
            bias: true,
            kernel_init: WeightInit::default(),
            bias_init: WeightInit::zeros(),
        }
    }

    /// Set the activation used between transpose layers.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Enable or disable layer normalization between transpose layers.
    pub fn with_layer_norm(mut self, layer_norm: bool) -> Self {
        self.layer_norm = layer_norm;
        self
    }

    /// Set whether transpose layers carry bias terms.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set the kernel weight initialization.
    pub fn with_kernel_init(mut self, init: WeightInit) -> Self {
        self.kernel_init = init;
        self
    }

    /// Set the initial dense projection's weight initialization.
    pub fn with_initial_dense_weight_init(mut self, init: WeightInit) -> Self {
        self.initial_dense_weight_init = init;
        self
    }

    /// Output image dimensions as (width, height, channels).
    pub fn output_dims(&self) -> [usize; 3] {
        self.cnn_config().output_dims()
    }

    fn cnn_config(&self) -> CnnTransposeConfig {
        CnnTransposeConfig::new(self.initial_image_dims, self.layers.clone())
            .with_activation(self.activation)
            .with_layer_norm(self.layer_norm)
            .with_bias(self.bias)
            .with_kernel_init(self.kernel_init.clone())
            .with_bias_init(self.bias_init.clone())
    }

    /// Initialize the head. Fails on an empty transpose stack or a
    /// zero-sized initial image axis.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<CnnTransposeHead<B>, HeadBuildError> {
        if self.layers.is_empty() {
            return Err(HeadBuildError::EmptyTransposeStack);
        }
        let [width, height, filters] = self.initial_image_dims;
        if width == 0 || height == 0 || filters == 0 {
            return Err(HeadBuildError::ZeroImageDim {
                dims: self.initial_image_dims,
            });
        }

        let cnn_config = self.cnn_config();
        let output_dims = cnn_config.output_dims();

        // The projection into the first "image" is always biased and never
        // activated; the transpose stack does the shaping.
        let initial_dense = DenseConfig::new(self.input_dim, width * height * filters)
            .with_weight_init(self.initial_dense_weight_init.clone())
            .with_bias_init(self.initial_dense_bias_init.clone())
            .init(device);

        Ok(CnnTransposeHead {
            initial_dense,
            cnn: cnn_config.init(device),
            input_dim: self.input_dim,
            initial_image_dims: self.initial_image_dims,
            output_dims,
        })
    }
}

/// Head decoding a feature vector into a channels-last image
/// `(batch, width, height, channels)`.
///
/// The raw stack output is shifted by a constant 0.5 so the non-activated,
/// non-normalized decode centers around zero-centered image conventions.
#[derive(Module, Debug)]
pub struct CnnTransposeHead<B: Backend> {
    initial_dense: Dense<B>,
    cnn: CnnTranspose<B>,
    input_dim: usize,
    initial_image_dims: [usize; 3],
    output_dims: [usize; 3],
}

impl<B: Backend> CnnTransposeHead<B> {
    /// Output image dimensions as (width, height, channels).
    pub fn output_dims(&self) -> [usize; 3] {
        self.output_dims
    }

    /// Forward pass over a `(batch, time, features)` input.
    ///
    /// # Returns
    /// Tensor of shape [batch, time, width, height, channels]
    pub fn forward_seq(&self, input: Tensor<B, 3>) -> Result<Tensor<B, 5>, TimeFoldError> {
        fold_time_to_image(&self.input_spec(), input, |x| self.forward(x))
    }
}

impl<B: Backend> Head<B> for CnnTransposeHead<B> {
    type Output = Tensor<B, 4>;

    fn input_spec(&self) -> TensorSpec {
        TensorSpec::batch_features(self.input_dim)
    }

    fn output_spec(&self) -> TensorSpec {
        let [width, height, channels] = self.output_dims;
        TensorSpec::batch_image(width, height, channels)
    }

    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch, _] = input.dims();
        let [width, height, filters] = self.initial_image_dims;

        let out = self.initial_dense.forward(input);
        // Enter the transpose stack in NCHW layout.
        let out = self.cnn.forward(out.reshape([batch, filters, height, width]));
        // Back to channels-last, recentered around image conventions.
        out.permute([0, 3, 2, 1]).add_scalar(0.5)
    }
}

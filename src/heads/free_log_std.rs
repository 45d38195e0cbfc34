//! Gaussian policy head with a state-independent, learned log-std.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::Head;
use crate::error::HeadBuildError;
use crate::fold::{fold_time, TimeFoldError};
use crate::nn::{Activation, Mlp, MlpConfig};
use crate::spec::TensorSpec;

/// Configuration for a [`FreeLogStdMlpHead`].
///
/// `net.output_dim` is the *full* head output width; the underlying network
/// only produces the mean half, and must therefore be even.
#[derive(Debug, Clone)]
pub struct FreeLogStdMlpHeadConfig {
    /// The underlying network configuration. Its `output_dim` counts both
    /// halves of the head output.
    pub net: MlpConfig,
    /// Whether to clip the learned log-std.
    pub clip_log_std: bool,
    /// Clip bound `c`: the log-std is clamped into `[-c, c]`. The default of
    /// infinity leaves it numerically unclipped.
    pub log_std_clip_param: f32,
}

impl FreeLogStdMlpHeadConfig {
    /// Create a configuration for the given input and (even) output widths.
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            net: MlpConfig::new(input_dim, output_dim),
            clip_log_std: false,
            log_std_clip_param: f32::INFINITY,
        }
    }

    /// Replace the underlying network configuration wholesale.
    pub fn with_net(mut self, net: MlpConfig) -> Self {
        self.net = net;
        self
    }

    /// Set the hidden layer widths.
    pub fn with_hidden_dims(mut self, hidden_dims: Vec<usize>) -> Self {
        self.net.hidden_dims = hidden_dims;
        self
    }

    /// Set the hidden activation.
    pub fn with_hidden_activation(mut self, activation: Activation) -> Self {
        self.net.hidden_activation = activation;
        self
    }

    /// Set the activation of the mean-producing output layer.
    pub fn with_output_activation(mut self, activation: Activation) -> Self {
        self.net.output_activation = activation;
        self
    }

    /// Set whether the output layer carries a bias.
    pub fn with_output_bias(mut self, bias: bool) -> Self {
        self.net.output_bias = bias;
        self
    }

    /// Enable or disable log-std clipping.
    pub fn with_clip_log_std(mut self, clip: bool) -> Self {
        self.clip_log_std = clip;
        self
    }

    /// Set the clip bound.
    pub fn with_log_std_clip_param(mut self, param: f32) -> Self {
        self.log_std_clip_param = param;
        self
    }

    /// Initialize the head. Fails when the output width is odd.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<FreeLogStdMlpHead<B>, HeadBuildError> {
        let output_dim = self.net.output_dim;
        if output_dim % 2 != 0 {
            return Err(HeadBuildError::OddOutputDim { output_dim });
        }
        let half = output_dim / 2;

        let mut net = self.net.clone();
        net.output_dim = half;

        Ok(FreeLogStdMlpHead {
            net: net.init(device),
            log_std: Param::from_tensor(Tensor::zeros([half], device)),
            clip_log_std: self.clip_log_std,
            log_std_clip_param: self.log_std_clip_param,
            input_dim: self.net.input_dim,
            output_dim,
        })
    }
}

/// MLP head whose log-std half is a trainable vector, independent of the
/// current input and broadcast across the batch.
///
/// The network produces the mean; the log-std starts at zero (std 1.0) and
/// is learned as a free parameter, giving every state the same exploration
/// level.
#[derive(Module, Debug)]
pub struct FreeLogStdMlpHead<B: Backend> {
    net: Mlp<B>,
    /// Learned log standard deviations, shape [output_dim / 2].
    pub log_std: Param<Tensor<B, 1>>,
    clip_log_std: bool,
    log_std_clip_param: f32,
    input_dim: usize,
    output_dim: usize,
}

impl<B: Backend> FreeLogStdMlpHead<B> {
    /// Forward pass over a `(batch, time, features)` input.
    ///
    /// # Returns
    /// Tensor of shape [batch, time, output_dim]
    pub fn forward_seq(&self, input: Tensor<B, 3>) -> Result<Tensor<B, 3>, TimeFoldError> {
        fold_time(&self.input_spec(), input, |x| self.forward(x))
    }
}

impl<B: Backend> Head<B> for FreeLogStdMlpHead<B> {
    type Output = Tensor<B, 2>;

    fn input_spec(&self) -> TensorSpec {
        TensorSpec::batch_features(self.input_dim)
    }

    fn output_spec(&self) -> TensorSpec {
        TensorSpec::batch_features(self.output_dim)
    }

    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = input.dims();
        let mean = self.net.forward(input);

        let log_std = if self.clip_log_std {
            self.log_std
                .val()
                .clamp(-self.log_std_clip_param, self.log_std_clip_param)
        } else {
            self.log_std.val()
        };
        // Same exploration level for every row of the batch.
        let log_std: Tensor<B, 2> = log_std.unsqueeze_dim(0).repeat_dim(0, batch);

        Tensor::cat(vec![mean, log_std], 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    fn device() -> <B as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_log_std_identical_across_batch() {
        let dev = device();
        let head: FreeLogStdMlpHead<B> = FreeLogStdMlpHeadConfig::new(6, 4)
            .with_hidden_dims(vec![8])
            .init(&dev)
            .unwrap();
        let input: Tensor<B, 2> = Tensor::random([5, 6], Distribution::Normal(0.0, 1.0), &dev);

        let out = head.forward(input);
        assert_eq!(out.dims(), [5, 4]);

        let data = out.into_data();
        let values: &[f32] = data.as_slice().unwrap();
        let first_row_log_std = &values[2..4];
        for row in values.chunks(4) {
            assert_eq!(&row[2..4], first_row_log_std);
        }
    }

    #[test]
    fn test_log_std_initialized_to_zero() {
        let dev = device();
        let head: FreeLogStdMlpHead<B> =
            FreeLogStdMlpHeadConfig::new(6, 4).init(&dev).unwrap();
        let input: Tensor<B, 2> = Tensor::random([3, 6], Distribution::Normal(0.0, 1.0), &dev);

        let data = head.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        for row in values.chunks(4) {
            assert_eq!(&row[2..4], &[0.0, 0.0]);
        }
    }

    #[test]
    fn test_clipping_bounds_learned_log_std() {
        let dev = device();
        let mut head: FreeLogStdMlpHead<B> = FreeLogStdMlpHeadConfig::new(6, 4)
            .with_clip_log_std(true)
            .with_log_std_clip_param(1.0)
            .init(&dev)
            .unwrap();
        head.log_std = Param::from_tensor(Tensor::from_floats([5.0, -5.0], &dev));

        let input: Tensor<B, 2> = Tensor::zeros([2, 6], &dev);
        let data = head.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        for row in values.chunks(4) {
            assert_eq!(&row[2..4], &[1.0, -1.0]);
        }
    }

    #[test]
    fn test_unclipped_log_std_passes_through() {
        let dev = device();
        let mut head: FreeLogStdMlpHead<B> =
            FreeLogStdMlpHeadConfig::new(6, 4).init(&dev).unwrap();
        head.log_std = Param::from_tensor(Tensor::from_floats([5.0, -5.0], &dev));

        let input: Tensor<B, 2> = Tensor::zeros([2, 6], &dev);
        let data = head.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert_eq!(&values[2..4], &[5.0, -5.0]);
    }

    #[test]
    fn test_output_layer_builders_configure_mean_net() {
        let dev = device();
        let config = FreeLogStdMlpHeadConfig::new(6, 4)
            .with_output_activation(Activation::Tanh)
            .with_output_bias(false);
        assert_eq!(config.net.output_activation, Activation::Tanh);
        assert!(!config.net.output_bias);

        let head: FreeLogStdMlpHead<B> = config.init(&dev).unwrap();
        let input: Tensor<B, 2> = Tensor::random([3, 6], Distribution::Normal(0.0, 100.0), &dev);
        let data = head.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        for row in values.chunks(4) {
            assert!(row[..2].iter().all(|v| v.abs() <= 1.0));
        }
    }

    #[test]
    fn test_odd_output_dim_fails_at_build() {
        let err = FreeLogStdMlpHeadConfig::new(6, 5)
            .init::<B>(&device())
            .unwrap_err();
        assert!(matches!(err, HeadBuildError::OddOutputDim { output_dim: 5 }));
    }

    #[test]
    fn test_forward_seq_shares_log_std_across_time() {
        let dev = device();
        let head: FreeLogStdMlpHead<B> = FreeLogStdMlpHeadConfig::new(6, 4)
            .with_hidden_dims(vec![8])
            .init(&dev)
            .unwrap();
        let input: Tensor<B, 3> = Tensor::random([2, 3, 6], Distribution::Normal(0.0, 1.0), &dev);

        let out = head.forward_seq(input).unwrap();
        assert_eq!(out.dims(), [2, 3, 4]);

        let data = out.into_data();
        let values: &[f32] = data.as_slice().unwrap();
        let first = &values[2..4];
        for row in values.chunks(4) {
            assert_eq!(&row[2..4], first);
        }
    }

    #[test]
    fn test_specs_report_full_output_dim() {
        let head: FreeLogStdMlpHead<B> =
            FreeLogStdMlpHeadConfig::new(6, 4).init(&device()).unwrap();
        assert_eq!(head.input_spec(), TensorSpec::batch_features(6));
        assert_eq!(head.output_spec(), TensorSpec::batch_features(4));
    }
}

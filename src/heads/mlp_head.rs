//! Feed-forward head with optional log-std clipping.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::Head;
use crate::error::HeadBuildError;
use crate::fold::{fold_time, TimeFoldError};
use crate::nn::{Activation, Mlp, MlpConfig};
use crate::spec::TensorSpec;

/// Configuration for an [`MlpHead`].
///
/// Clipping should be enabled only for policy heads that emit
/// `[means, log_stds]` pairs; value heads must never be clipped.
#[derive(Debug, Clone)]
pub struct MlpHeadConfig {
    /// The underlying network. Its `output_dim` is the head's output width.
    pub net: MlpConfig,
    /// Whether to clip the log-std half of the output.
    pub clip_log_std: bool,
    /// Clip bound `c`: log-stds are clamped into `[-c, c]`. The default of
    /// infinity leaves values numerically unclipped.
    pub log_std_clip_param: f32,
}

impl MlpHeadConfig {
    /// Create a configuration for the given input and output widths.
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

    /// Set the output activation.
    pub fn with_output_activation(mut self, activation: Activation) -> Self {
        self.net.output_activation = activation;
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

    /// Initialize the head.
    ///
    /// Fails when clipping is requested for an odd output width, which
    /// cannot be split evenly into means and log-stds.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MlpHead<B>, HeadBuildError> {
        if self.clip_log_std && self.net.output_dim % 2 != 0 {
            return Err(HeadBuildError::OddOutputDim {
                output_dim: self.net.output_dim,
            });
        }
        Ok(MlpHead {
            net: self.net.init(device),
            clip_log_std: self.clip_log_std,
            log_std_clip_param: self.log_std_clip_param,
            input_dim: self.net.input_dim,
            output_dim: self.net.output_dim,
        })
    }
}

/// Feed-forward head producing `(batch, output_dim)` outputs.
///
/// With clipping enabled, the output is interpreted as
/// `[means | log_stds]` halves along the feature axis and the log-std half
/// is clamped into `[-c, c]` before re-concatenation.
#[derive(Module, Debug)]
pub struct MlpHead<B: Backend> {
    net: Mlp<B>,
    clip_log_std: bool,
    log_std_clip_param: f32,
    input_dim: usize,
    output_dim: usize,
}

impl<B: Backend> MlpHead<B> {
    /// Forward pass over a `(batch, time, features)` input, folding the time
    /// axis into the batch around the per-row computation.
    ///
    /// # Returns
    /// Tensor of shape [batch, time, output_dim]
    pub fn forward_seq(&self, input: Tensor<B, 3>) -> Result<Tensor<B, 3>, TimeFoldError> {
        fold_time(&self.input_spec(), input, |x| self.forward(x))
    }
}

impl<B: Backend> Head<B> for MlpHead<B> {
    type Output = Tensor<B, 2>;

    fn input_spec(&self) -> TensorSpec {
        TensorSpec::batch_features(self.input_dim)
    }

    fn output_spec(&self) -> TensorSpec {
        TensorSpec::batch_features(self.output_dim)
    }

    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let out = self.net.forward(input);
        if !self.clip_log_std {
            return out;
        }

        let [batch, features] = out.dims();
        let half = features / 2;
        let means = out.clone().slice([0..batch, 0..half]);
        let log_stds = out
            .slice([0..batch, half..features])
            .clamp(-self.log_std_clip_param, self.log_std_clip_param);
        Tensor::cat(vec![means, log_stds], 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    use crate::nn::WeightInit;

    type B = NdArray<f32>;

    fn device() -> <B as Backend>::Device {
        Default::default()
    }

    /// Head whose raw outputs are far outside any reasonable clip range.
    fn saturated_head(clip: bool, clip_param: f32) -> MlpHead<B> {
        let mut config = MlpHeadConfig::new(8, 4)
            .with_hidden_dims(vec![16])
            .with_clip_log_std(clip)
            .with_log_std_clip_param(clip_param);
        config.net.hidden_weight_init = WeightInit::constant(1.0);
        config.net.output_weight_init = WeightInit::constant(1.0);
        config.init(&device()).unwrap()
    }

    #[test]
    fn test_clip_bounds_log_std_half() {
        let head = saturated_head(true, 1.0);
        let input: Tensor<B, 2> = Tensor::ones([3, 8], &device());

        let out = head.forward(input);
        assert_eq!(out.dims(), [3, 4]);

        let data = out.into_data();
        let values: &[f32] = data.as_slice().unwrap();
        for row in values.chunks(4) {
            // Mean half saturates far above 1, log-std half is clamped.
            assert!(row[0] > 1.0 && row[1] > 1.0);
            assert!(row[2] >= -1.0 && row[2] <= 1.0);
            assert!(row[3] >= -1.0 && row[3] <= 1.0);
        }
    }

    #[test]
    fn test_unclipped_head_is_unbounded() {
        let head = saturated_head(false, 1.0);
        let input: Tensor<B, 2> = Tensor::ones([3, 8], &device());

        let data = head.forward(input).into_data();
        let values: &[f32] = data.as_slice().unwrap();
        assert!(values.iter().all(|&v| v > 1.0));
    }

    #[test]
    fn test_infinite_clip_param_leaves_values_untouched() {
        let clipped = saturated_head(true, f32::INFINITY);
        let free = saturated_head(false, 1.0);
        let input: Tensor<B, 2> = Tensor::ones([2, 8], &device());

        let diff = (clipped.forward(input.clone()) - free.forward(input))
            .abs()
            .max()
            .into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn test_checked_forward_is_noop_for_matching_input() {
        let dev = device();
        let head: MlpHead<B> = MlpHeadConfig::new(8, 4)
            .with_hidden_dims(vec![16])
            .init(&dev)
            .unwrap();
        let input: Tensor<B, 2> = Tensor::random([3, 8], Distribution::Normal(0.0, 1.0), &dev);

        let checked = head.forward_checked(input.clone()).unwrap();
        let unchecked = head.forward(input);
        let diff = (checked - unchecked).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn test_checked_forward_rejects_wrong_feature_dim() {
        let dev = device();
        let head: MlpHead<B> = MlpHeadConfig::new(8, 4).init(&dev).unwrap();
        let input: Tensor<B, 2> = Tensor::zeros([3, 7], &dev);

        let err = head.forward_checked(input).unwrap_err();
        assert!(matches!(err, TimeFoldError::Incompatible { .. }));
    }

    #[test]
    fn test_forward_seq_matches_folded_forward() {
        let dev = device();
        let head: MlpHead<B> = MlpHeadConfig::new(8, 4)
            .with_hidden_dims(vec![16])
            .init(&dev)
            .unwrap();
        let input: Tensor<B, 3> = Tensor::random([2, 5, 8], Distribution::Normal(0.0, 1.0), &dev);

        let seq_out = head.forward_seq(input.clone()).unwrap();
        assert_eq!(seq_out.dims(), [2, 5, 4]);

        let flat_out = head.forward(input.reshape([10, 8]));
        let diff = (seq_out.reshape([10, 4]) - flat_out).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn test_forward_seq_rejects_wrong_feature_dim() {
        let dev = device();
        let head: MlpHead<B> = MlpHeadConfig::new(8, 4).init(&dev).unwrap();
        let input: Tensor<B, 3> = Tensor::zeros([2, 5, 7], &dev);

        let err = head.forward_seq(input).unwrap_err();
        match err {
            TimeFoldError::Incompatible { shape, folded, .. } => {
                assert_eq!(shape, vec![2, 5, 7]);
                assert_eq!(folded, vec![10, 7]);
            }
            other => panic!("expected incompatible error, got {:?}", other),
        }
    }

    #[test]
    fn test_odd_output_dim_with_clipping_fails_at_build() {
        let err = MlpHeadConfig::new(8, 5)
            .with_clip_log_std(true)
            .init::<B>(&device())
            .unwrap_err();
        assert!(matches!(err, HeadBuildError::OddOutputDim { output_dim: 5 }));
    }

    #[test]
    fn test_odd_output_dim_without_clipping_is_fine() {
        let head: MlpHead<B> = MlpHeadConfig::new(8, 5).init(&device()).unwrap();
        let input: Tensor<B, 2> = Tensor::zeros([2, 8], &device());
        assert_eq!(head.forward(input).dims(), [2, 5]);
    }

    #[test]
    fn test_specs() {
        let head: MlpHead<B> = MlpHeadConfig::new(8, 4).init(&device()).unwrap();
        assert_eq!(head.input_spec(), TensorSpec::batch_features(8));
        assert_eq!(head.output_spec(), TensorSpec::batch_features(4));
    }
}

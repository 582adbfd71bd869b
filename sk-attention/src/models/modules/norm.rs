//! # Mode-Aware Batch Normalization
//!
//! Burn's `BatchNorm` picks between batch and running statistics from whether
//! the backend tracks gradients. The attention block needs that choice to be
//! an explicit argument, so this module carries the same parameters and state
//! but takes a [`Mode`] on every forward call.

use burn::{
    module::{Param, RunningState},
    nn::Initializer,
    prelude::*,
};

use crate::config::{Mode, NormConfig};

/// Configuration for the [`BatchNorm2d`] module.
#[derive(Config, Debug)]
pub struct BatchNorm2dConfig {
    /// Number of channels normalized.
    pub num_features: usize,
    /// Weight of the current batch when updating running statistics.
    #[config(default = 0.1)]
    pub momentum: f64,
    /// Value added to the variance for numerical stability.
    #[config(default = 1e-5)]
    pub epsilon: f64,
}

impl BatchNorm2dConfig {
    /// Builds a configuration for `num_features` channels from shared norm settings.
    pub fn from_norm(num_features: usize, norm: &NormConfig) -> Self {
        Self::new(num_features)
            .with_momentum(norm.momentum)
            .with_epsilon(norm.epsilon)
    }

    /// Initializes a new `BatchNorm2d` module with unit scale, zero shift and
    /// standard-normal running statistics.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> BatchNorm2d<B> {
        let gamma = Initializer::Ones.init([self.num_features], device);
        let beta = Initializer::Zeros.init([self.num_features], device);

        let running_mean = Tensor::zeros([self.num_features], device);
        let running_var = Tensor::ones([self.num_features], device);

        BatchNorm2d {
            gamma,
            beta,
            running_mean: RunningState::new(running_mean),
            running_var: RunningState::new(running_var),
            momentum: self.momentum,
            epsilon: self.epsilon,
        }
    }
}

/// Batch normalization over the channel axis of `[batch, channels, height, width]`.
///
/// In [`Mode::Train`] the statistics are aggregated over the batch and both
/// spatial axes, so samples in a batch influence each other's output. This is
/// the only cross-sample coupling in the attention block. In [`Mode::Eval`]
/// every sample is normalized independently with the running estimates.
#[derive(Module, Debug)]
pub struct BatchNorm2d<B: Backend> {
    /// Learned scale.
    pub gamma: Param<Tensor<B, 1>>,
    /// Learned shift.
    pub beta: Param<Tensor<B, 1>>,
    /// Exponential moving average of the batch means.
    pub running_mean: RunningState<Tensor<B, 1>>,
    /// Exponential moving average of the unbiased batch variances.
    pub running_var: RunningState<Tensor<B, 1>>,
    momentum: f64,
    epsilon: f64,
}

impl<B: Backend> BatchNorm2d<B> {
    /// # Shapes
    /// - input: `[batch, channels, height, width]`
    /// - output: `[batch, channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        if mode.is_train() {
            self.forward_train(x)
        } else {
            self.forward_eval(x)
        }
    }

    fn forward_eval(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let device = x.device();
        let channels = x.dims()[1];

        let mean = self.running_mean.value_sync().to_device(&device);
        let var = self.running_var.value_sync().to_device(&device);

        self.normalize(
            x,
            mean.reshape([1, channels, 1, 1]),
            var.reshape([1, channels, 1, 1]),
        )
    }

    fn forward_train(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let device = x.device();
        let [batch, channels, height, width] = x.dims();

        let flat = x
            .clone()
            .swap_dims(0, 1)
            .reshape([channels, batch * height * width]);
        let mean = flat.clone().mean_dim(1);
        let centered = flat.sub(mean.clone());
        let var = centered.clone().mul(centered).mean_dim(1);

        let running_mean = self.running_mean.value_sync().to_device(&device);
        let running_var = self.running_var.value_sync().to_device(&device);

        let running_mean = running_mean.mul_scalar(1.0 - self.momentum).add(
            mean.clone()
                .detach()
                .mul_scalar(self.momentum)
                .reshape([channels]),
        );
        // running estimate tracks the unbiased variance, normalization uses the biased one
        let count = batch * height * width;
        let correction = if count > 1 {
            count as f64 / (count - 1) as f64
        } else {
            1.0
        };
        let running_var = running_var.mul_scalar(1.0 - self.momentum).add(
            var.clone()
                .detach()
                .mul_scalar(self.momentum * correction)
                .reshape([channels]),
        );

        self.running_mean.update(running_mean.detach());
        self.running_var.update(running_var.detach());

        self.normalize(
            x,
            mean.reshape([1, channels, 1, 1]),
            var.reshape([1, channels, 1, 1]),
        )
    }

    fn normalize(&self, x: Tensor<B, 4>, mean: Tensor<B, 4>, var: Tensor<B, 4>) -> Tensor<B, 4> {
        let channels = x.dims()[1];
        let std = var.add_scalar(self.epsilon).sqrt();

        x.sub(mean)
            .div(std)
            .mul(self.gamma.val().reshape([1, channels, 1, 1]))
            .add(self.beta.val().reshape([1, channels, 1, 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        tensor::Distribution,
    };

    type TestBackend = NdArray;
    type TestDevice = NdArrayDevice;

    #[test]
    fn test_eval_mode_uses_initial_running_stats() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(3).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::random([2, 3, 4, 4], Distribution::Default, &device);

        // mean 0, var 1: only epsilon separates output from input
        let output = bn.forward(x.clone(), Mode::Eval);
        let diff = (output - x).abs().max().into_scalar();

        assert!(diff < 1e-4, "eval output drifted by {diff}");
    }

    #[test]
    fn test_train_mode_normalizes_batch() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(4).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::random(
            [3, 4, 5, 5],
            Distribution::Normal(3.0, 2.0),
            &device,
        );

        let output = bn.forward(x, Mode::Train);
        let flat = output.swap_dims(0, 1).reshape([4, 3 * 5 * 5]);
        let mean = flat.clone().mean_dim(1);
        let var = flat.sub(mean.clone()).powf_scalar(2.0).mean_dim(1);

        assert!(mean.abs().max().into_scalar() < 1e-4);
        assert!(var.sub_scalar(1.0).abs().max().into_scalar() < 1e-2);
    }

    #[test]
    fn test_train_mode_updates_running_stats() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(2)
            .with_momentum(0.5)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::full([2, 2, 3, 3], 4.0, &device);

        let _ = bn.forward(x, Mode::Train);

        // 0.5 * 0 + 0.5 * 4 and 0.5 * 1 + 0.5 * 0
        let mean = bn.running_mean.value_sync().into_data().to_vec::<f32>().unwrap();
        let var = bn.running_var.value_sync().into_data().to_vec::<f32>().unwrap();
        assert_eq!(mean, vec![2.0, 2.0]);
        assert_eq!(var, vec![0.5, 0.5]);
    }

    #[test]
    fn test_running_variance_is_unbiased() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(1)
            .with_momentum(1.0)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![0.0f32, 2.0], [2, 1, 1, 1]),
            &device,
        );

        let output = bn.forward(x, Mode::Train);

        // batch variance 1, corrected by 2 / (2 - 1)
        let var = bn.running_var.value_sync().into_data().to_vec::<f32>().unwrap();
        assert_eq!(var, vec![2.0]);
        let mean = bn.running_mean.value_sync().into_data().to_vec::<f32>().unwrap();
        assert_eq!(mean, vec![1.0]);

        // the batch itself is still normalized with the biased variance
        let normalized = output.into_data().to_vec::<f32>().unwrap();
        assert!((normalized[0] + 1.0).abs() < 1e-4);
        assert!((normalized[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_running_variance_over_spatial_positions() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(1)
            .with_momentum(0.5)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![1.0f32, 3.0, 5.0, 7.0], [1, 1, 2, 2]),
            &device,
        );

        let _ = bn.forward(x, Mode::Train);

        // batch variance 5, unbiased 20 / 3, blended with the initial 1
        let var = bn.running_var.value_sync().into_data().to_vec::<f32>().unwrap();
        let expected = 0.5 + 0.5 * 20.0 / 3.0;
        assert!((var[0] - expected).abs() < 1e-5, "running var {var:?}");
    }

    #[test]
    fn test_eval_mode_leaves_running_stats() {
        let device = TestDevice::default();
        let bn = BatchNorm2dConfig::new(2).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::full([2, 2, 3, 3], 4.0, &device);

        let _ = bn.forward(x, Mode::Eval);

        let mean = bn.running_mean.value_sync().into_data().to_vec::<f32>().unwrap();
        let var = bn.running_var.value_sync().into_data().to_vec::<f32>().unwrap();
        assert_eq!(mean, vec![0.0, 0.0]);
        assert_eq!(var, vec![1.0, 1.0]);
    }
}

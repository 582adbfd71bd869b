use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Relu,
    },
    prelude::*,
};

use super::{BatchNorm2d, BatchNorm2dConfig};
use crate::config::{Mode, NormConfig};

/// A two-layer pointwise reduction producing the contrastive embedding.
#[derive(Config, Debug)]
pub struct ProjectionHeadConfig {
    in_channels: usize,
    #[config(default = "256")]
    hidden_channels: usize,
    #[config(default = "128")]
    out_channels: usize,
    #[config(default = "NormConfig::new()")]
    norm: NormConfig,
}

impl ProjectionHeadConfig {
    /// Initializes a `ProjectionHead` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ProjectionHead<B> {
        let conv1 = Conv2dConfig::new([self.in_channels, self.hidden_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let bn1 = BatchNorm2dConfig::from_norm(self.hidden_channels, &self.norm).init(device);
        let conv2 = Conv2dConfig::new([self.hidden_channels, self.out_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let bn2 = BatchNorm2dConfig::from_norm(self.out_channels, &self.norm).init(device);

        ProjectionHead {
            conv1,
            bn1,
            conv2,
            bn2,
            relu: Relu::new(),
        }
    }
}

/// Side output of the attention block. It reads the fused features and never
/// feeds back into them.
#[derive(Module, Debug)]
pub struct ProjectionHead<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm2d<B>,
    conv2: Conv2d<B>,
    bn2: BatchNorm2d<B>,
    relu: Relu,
}

impl<B: Backend> ProjectionHead<B> {
    /// # Shapes
    /// - input: `[batch, in_channels, height, width]`
    /// - output: `[batch, out_channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        let x = self.relu.forward(self.bn1.forward(self.conv1.forward(x), mode));

        self.relu.forward(self.bn2.forward(self.conv2.forward(x), mode))
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
    fn test_default_widths() {
        let device = TestDevice::default();
        let head = ProjectionHeadConfig::new(32).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::random([2, 32, 6, 5], Distribution::Default, &device);

        let y = head.forward(x, Mode::Eval);

        assert_eq!(y.dims(), [2, 128, 6, 5]);
        assert!(y.min().into_scalar() >= 0.0);
    }

    #[test]
    fn test_custom_widths() {
        let device = TestDevice::default();
        let head = ProjectionHeadConfig::new(8)
            .with_hidden_channels(6)
            .with_out_channels(3)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::random([1, 8, 4, 4], Distribution::Default, &device);

        assert_eq!(head.forward(x, Mode::Train).dims(), [1, 3, 4, 4]);
    }
}

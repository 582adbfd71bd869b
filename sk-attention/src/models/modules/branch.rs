//! # Branch Generator
//!
//! The parallel receptive-field transforms of the selective-kernel block: one
//! 1x1 projection and one dilated 3x3 convolution per dilation rate, each
//! followed by batch normalization and ReLU.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

use super::{BatchNorm2d, BatchNorm2dConfig};
use crate::config::{Mode, NormConfig, SkAttentionConfig};

/// Configuration for a single [`SkBranch`].
#[derive(Debug)]
pub struct SkBranchConfig {
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    dilation: usize,
    groups: usize,
    norm: NormConfig,
}

impl SkBranchConfig {
    /// The 1x1 projection branch.
    pub fn pointwise(
        in_channels: usize,
        out_channels: usize,
        groups: usize,
        norm: NormConfig,
    ) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size: 1,
            dilation: 1,
            groups,
            norm,
        }
    }

    /// A 3x3 branch with the given dilation rate.
    pub fn dilated(
        in_channels: usize,
        out_channels: usize,
        dilation: usize,
        groups: usize,
        norm: NormConfig,
    ) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size: 3,
            dilation,
            groups,
            norm,
        }
    }

    /// Initializes a new `SkBranch`.
    ///
    /// Padding equals the dilation for 3x3 kernels and is zero for 1x1
    /// kernels, so the output keeps the input's height and width.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SkBranch<B> {
        let padding = (self.kernel_size / 2) * self.dilation;

        let conv = Conv2dConfig::new(
            [self.in_channels, self.out_channels],
            [self.kernel_size, self.kernel_size],
        )
        .with_stride([1, 1])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_dilation([self.dilation, self.dilation])
        .with_groups(self.groups)
        .with_bias(false)
        .init(device);
        let bn = BatchNorm2dConfig::from_norm(self.out_channels, &self.norm).init(device);
        let relu = Relu::new();

        SkBranch {
            conv,
            bn,
            relu,
            dilation: self.dilation,
        }
    }
}

/// One branch of the selective-kernel block: conv, batch norm, ReLU.
#[derive(Module, Debug)]
pub struct SkBranch<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm2d<B>,
    relu: Relu,
    dilation: usize,
}

impl<B: Backend> SkBranch<B> {
    /// # Shapes
    /// - input: `[batch, in_channels, height, width]`
    /// - output: `[batch, out_channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x, mode);

        self.relu.forward(x)
    }

    /// Dilation rate of the branch convolution (1 for the pointwise branch).
    pub const fn dilation(&self) -> usize {
        self.dilation
    }
}

/// Builds the ordered branch list: the 1x1 branch first, then one dilated
/// branch per entry of `config.kernels` in configuration order.
///
/// The gate projections are built in the same order and paired with these
/// branches by position.
pub fn build_branches<B: Backend>(
    config: &SkAttentionConfig,
    device: &Device<B>,
) -> Vec<SkBranch<B>> {
    let mut branches = Vec::with_capacity(config.num_branches());
    branches.push(
        SkBranchConfig::pointwise(
            config.channel_in,
            config.channel,
            config.group,
            config.norm.clone(),
        )
        .init(device),
    );
    branches.extend(config.kernels.iter().map(|&dilation| {
        SkBranchConfig::dilated(
            config.channel_in,
            config.channel,
            dilation,
            config.group,
            config.norm.clone(),
        )
        .init(device)
    }));

    branches
}

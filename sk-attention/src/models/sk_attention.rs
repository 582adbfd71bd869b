//! # Selective-Kernel Attention
//!
//! Runs several receptive fields over the same input and lets a learned,
//! per-channel softmax gate decide how much each one contributes:
//!
//! 1. every branch transforms the input (`[branches, batch, channel, h, w]`)
//! 2. the branches are summed and averaged over space (`[batch, channel]`)
//! 3. the gate maps that descriptor to one logit per branch and channel
//! 4. a softmax over the branch axis turns logits into mixing weights
//! 5. the weighted sum of the branches is the fused output, and the
//!    projection head derives the embedding from it

use burn::{prelude::*, tensor::activation::softmax};
use burn_extra_ops::{BranchTensorExtraOps, TensorExtraOps};

use super::modules::{
    build_branches, Gate, GateConfig, ProjectionHead, ProjectionHeadConfig, SkBranch,
};
use crate::{
    config::{Mode, SkAttentionConfig},
    error::{SkAttentionError, SkAttentionResult},
};

impl SkAttentionConfig {
    /// Validates the configuration and initializes a new [`SkAttention`] module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SkAttentionError::InvalidConfiguration)` if the
    /// configuration is rejected by [`validate`](Self::validate).
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SkAttentionResult<SkAttention<B>> {
        self.validate()?;

        let bottleneck_dim = self.bottleneck_dim();
        let convs = build_branches(self, device);
        let gate = GateConfig::new(self.channel, bottleneck_dim, convs.len()).init(device);
        let mlp = ProjectionHeadConfig::new(self.channel)
            .with_hidden_channels(self.projection_hidden)
            .with_out_channels(self.projection_out)
            .with_norm(self.norm.clone())
            .init(device);

        tracing::debug!(
            channel_in = self.channel_in,
            channel = self.channel,
            dilations = ?self.kernels,
            group = self.group,
            bottleneck_dim,
            "initialized selective-kernel attention"
        );

        Ok(SkAttention {
            convs,
            gate,
            mlp,
            channel_in: self.channel_in,
            channel: self.channel,
            bottleneck_dim,
        })
    }
}

/// Every intermediate of a forward pass.
#[derive(Debug, Clone)]
pub struct SkAttentionOutput<B: Backend> {
    /// Branch outputs stacked in branch order: `[branches, batch, channel, height, width]`.
    pub branches: Tensor<B, 5>,
    /// Spatial mean of the summed branches: `[batch, channel]`.
    pub descriptor: Tensor<B, 2>,
    /// Gate bottleneck vector: `[batch, d]`.
    pub bottleneck: Tensor<B, 2>,
    /// Softmax-normalized branch weights: `[branches, batch, channel, 1, 1]`.
    pub attention: Tensor<B, 5>,
    /// Per-channel convex combination of the branches: `[batch, channel, height, width]`.
    pub fused: Tensor<B, 4>,
    /// Projection head output: `[batch, projection_out, height, width]`.
    pub embedding: Tensor<B, 4>,
}

/// Multi-branch channel-attention fusion block.
#[derive(Module, Debug)]
pub struct SkAttention<B: Backend> {
    convs: Vec<SkBranch<B>>,
    gate: Gate<B>,
    mlp: ProjectionHead<B>,
    channel_in: usize,
    channel: usize,
    bottleneck_dim: usize,
}

impl<B: Backend> SkAttention<B> {
    /// Returns the fused features and the projection head embedding.
    ///
    /// # Shapes
    /// - input: `[batch, channel_in, height, width]`
    /// - fused: `[batch, channel, height, width]`
    /// - embedding: `[batch, projection_out, height, width]`
    ///
    /// # Errors
    ///
    /// Returns `Err(SkAttentionError::InvalidTensorShape)` if the input does
    /// not have `channel_in` channels or has an empty axis.
    pub fn forward(
        &self,
        x: Tensor<B, 4>,
        mode: Mode,
    ) -> SkAttentionResult<(Tensor<B, 4>, Tensor<B, 4>)> {
        let output = self.forward_detailed(x, mode)?;

        Ok((output.fused, output.embedding))
    }

    /// Runs the full block and keeps every intermediate.
    ///
    /// # Errors
    ///
    /// See [`forward`](Self::forward).
    pub fn forward_detailed(
        &self,
        x: Tensor<B, 4>,
        mode: Mode,
    ) -> SkAttentionResult<SkAttentionOutput<B>> {
        self.check_input(&x)?;

        // split
        let outs = self
            .convs
            .iter()
            .map(|conv| conv.forward(x.clone(), mode))
            .collect::<Vec<_>>();
        let feats = Tensor::stack::<5>(outs, 0);

        // fuse
        let u = feats.clone().sum_dim(0).squeeze::<4>(0);
        let s = u.spatial_mean();

        // select
        let (z, logits) = self.gate.forward(s.clone());
        let attention = softmax(logits, 0);
        let v = feats.clone().weighted_branch_sum(attention.clone());

        let embedding = self.mlp.forward(v.clone(), mode);

        Ok(SkAttentionOutput {
            branches: feats,
            descriptor: s,
            bottleneck: z,
            attention,
            fused: v,
            embedding,
        })
    }

    /// Returns only the branch weights, `[branches, batch, channel, 1, 1]`.
    ///
    /// # Errors
    ///
    /// See [`forward`](Self::forward).
    pub fn attention_weights(
        &self,
        x: Tensor<B, 4>,
        mode: Mode,
    ) -> SkAttentionResult<Tensor<B, 5>> {
        Ok(self.forward_detailed(x, mode)?.attention)
    }

    /// Size of the gate bottleneck.
    pub const fn bottleneck_dim(&self) -> usize {
        self.bottleneck_dim
    }

    /// Number of branches, the 1x1 branch included.
    pub fn num_branches(&self) -> usize {
        self.convs.len()
    }

    /// Dilation rates of the 3x3 branches in branch order.
    pub fn dilations(&self) -> Vec<usize> {
        self.convs.iter().skip(1).map(SkBranch::dilation).collect()
    }

    /// Expected number of input channels.
    pub const fn channel_in(&self) -> usize {
        self.channel_in
    }

    /// Number of channels of the fused output.
    pub const fn channel(&self) -> usize {
        self.channel
    }

    fn check_input(&self, x: &Tensor<B, 4>) -> SkAttentionResult<()> {
        let dims = x.dims();
        let [batch, channels, height, width] = dims;

        if channels != self.channel_in || batch == 0 || height == 0 || width == 0 {
            return Err(SkAttentionError::InvalidTensorShape {
                expected: format!("[batch > 0, {}, height > 0, width > 0]", self.channel_in),
                actual: format!("{dims:?}"),
            });
        }

        Ok(())
    }
}

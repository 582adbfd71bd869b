//! Forward-pass report: runs the attention block on synthetic input and
//! summarizes the shapes and the softmax invariant.

use anyhow::{ensure, Result};
use burn::{
    prelude::*,
    tensor::{Distribution, ElementConversion},
};
use serde::Serialize;
use sk_attention::SkAttentionConfig;

use crate::config::RunConfig;

/// Tolerance for the per-channel attention sum.
pub const ATTENTION_SUM_TOLERANCE: f32 = 1e-5;

/// Summary of one forward pass.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardReport {
    pub input_shape: [usize; 4],
    pub fused_shape: [usize; 4],
    pub embedding_shape: [usize; 4],
    pub attention_shape: [usize; 5],
    pub num_branches: usize,
    pub dilations: Vec<usize>,
    pub bottleneck_dim: usize,
    pub num_params: usize,
    /// Largest `|sum - 1|` over every (batch, channel) pair.
    pub max_attention_deviation: f32,
}

/// Structural facts about a configuration, without running it.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub channel_in: usize,
    pub channel: usize,
    pub dilations: Vec<usize>,
    pub num_branches: usize,
    pub bottleneck_dim: usize,
    pub num_params: usize,
}

/// Builds the block and reports its structure.
pub fn describe<B: Backend>(
    config: &SkAttentionConfig,
    device: &B::Device,
) -> Result<ModelInfo> {
    let model = config.init::<B>(device)?;

    Ok(ModelInfo {
        channel_in: model.channel_in(),
        channel: model.channel(),
        dilations: model.dilations(),
        num_branches: model.num_branches(),
        bottleneck_dim: model.bottleneck_dim(),
        num_params: model.num_params(),
    })
}

/// Builds the block, runs it once on standard-normal input and checks that the
/// attention weights sum to one for every (batch, channel) pair.
pub fn run_forward<B: Backend>(run: &RunConfig, device: &B::Device) -> Result<ForwardReport> {
    ensure!(run.batch_size > 0, "Batch size must be greater than 0");
    ensure!(
        run.height > 0 && run.width > 0,
        "Input height and width must be greater than 0"
    );

    if let Some(seed) = run.seed {
        B::seed(seed);
    }

    let model = run.model.init::<B>(device)?;
    let input_shape = [run.batch_size, run.model.channel_in, run.height, run.width];
    let x = Tensor::<B, 4>::random(input_shape, Distribution::Normal(0.0, 1.0), device);

    tracing::info!(shape = ?input_shape, mode = ?run.mode, "running forward pass");
    let output = model.forward_detailed(x, run.mode)?;

    let attention_shape = output.attention.dims();
    let max_attention_deviation: f32 = output
        .attention
        .sum_dim(0)
        .sub_scalar(1.0)
        .abs()
        .max()
        .into_scalar()
        .elem();

    ensure!(
        max_attention_deviation < ATTENTION_SUM_TOLERANCE,
        "Attention weights deviate from 1 by {max_attention_deviation}"
    );

    Ok(ForwardReport {
        input_shape,
        fused_shape: output.fused.dims(),
        embedding_shape: output.embedding.dims(),
        attention_shape,
        num_branches: model.num_branches(),
        dilations: model.dilations(),
        bottleneck_dim: model.bottleneck_dim(),
        num_params: model.num_params(),
        max_attention_deviation,
    })
}

//! # Weighted Branch Sum
//!
//! Collapses a stack of parallel feature maps into one map using per-branch
//! weights that broadcast over the trailing axes.

use burn::prelude::*;

/// Multiplies every branch by its weight and sums over the branch axis.
///
/// `weights` may have size 1 on any axis of `features` (typically the spatial
/// axes), in which case it is broadcast.
///
/// # Shapes
/// - features: `[branches, batch, channels, height, width]`
/// - weights: `[branches, batch, channels, 1, 1]`
/// - output: `[batch, channels, height, width]`
pub fn weighted_branch_sum<B: Backend>(
    features: Tensor<B, 5>,
    weights: Tensor<B, 5>,
) -> Tensor<B, 4> {
    features.mul(weights).sum_dim(0).squeeze::<4>(0)
}

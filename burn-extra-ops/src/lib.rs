//! Additional operations for the Burn deep learning framework
//!
//! This crate provides reductions that multi-branch attention blocks need but
//! that are not available as single calls in the core Burn framework.

use burn::prelude::*;

mod branch_sum;
mod spatial_mean;

// Convenient re-exports
pub use branch_sum::weighted_branch_sum;
pub use spatial_mean::spatial_mean;

/// Additional operations for 4-D feature maps (`[batch, channels, height, width]`)
pub trait TensorExtraOps<B: Backend> {
    /// Global average over the spatial axes, yielding `[batch, channels]`
    fn spatial_mean(self) -> Tensor<B, 2>;
}

impl<B: Backend> TensorExtraOps<B> for Tensor<B, 4> {
    fn spatial_mean(self) -> Tensor<B, 2> {
        spatial_mean(self)
    }
}

/// Additional operations for branch-stacked feature maps
/// (`[branches, batch, channels, height, width]`)
pub trait BranchTensorExtraOps<B: Backend> {
    /// Weight every branch and collapse the branch axis.
    fn weighted_branch_sum(self, weights: Tensor<B, 5>) -> Tensor<B, 4>;
}

impl<B: Backend> BranchTensorExtraOps<B> for Tensor<B, 5> {
    fn weighted_branch_sum(self, weights: Tensor<B, 5>) -> Tensor<B, 4> {
        weighted_branch_sum(self, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::Tensor,
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_tensor_extra_ops() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 4>::random(
            [2, 3, 4, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        assert_eq!(tensor.clone().spatial_mean().dims(), [2, 3]);

        let stacked = Tensor::stack::<5>(vec![tensor.clone(), tensor.clone()], 0);
        let weights = Tensor::<TestBackend, 5>::full([2, 2, 3, 1, 1], 0.5, &device);
        let fused = stacked.weighted_branch_sum(weights);
        assert_eq!(fused.dims(), tensor.dims());
    }
}

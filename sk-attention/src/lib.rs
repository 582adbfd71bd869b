//! Selective-kernel multi-branch channel attention for Burn.
//!
//! The block runs a 1x1 projection and several dilated 3x3 convolutions over
//! the same feature map, then mixes them per channel with softmax weights
//! predicted from the map itself.
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use burn::prelude::*;
//! use sk_attention::{Mode, SkAttentionConfig};
//!
//! let device = Default::default();
//! let model = SkAttentionConfig::new()
//!     .with_reduction(8)
//!     .init::<NdArray>(&device)?;
//!
//! let x = Tensor::<NdArray, 4>::zeros([2, 2048, 7, 7], &device);
//! let (fused, embedding) = model.forward(x, Mode::Eval)?;
//! assert_eq!(fused.dims(), [2, 512, 7, 7]);
//! assert_eq!(embedding.dims(), [2, 128, 7, 7]);
//! # Ok::<(), sk_attention::SkAttentionError>(())
//! ```

mod config;
mod error;
mod models;

pub use config::{Mode, NormConfig, SkAttentionConfig};
pub use error::{SkAttentionError, SkAttentionResult};
pub use models::{
    BatchNorm2d, BatchNorm2dConfig, Gate, GateConfig, ProjectionHead, ProjectionHeadConfig,
    SkAttention, SkAttentionOutput, SkAttentionRecord, SkBranch, SkBranchConfig,
};

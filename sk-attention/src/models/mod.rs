//! # Model Architectures
//!
//! - `modules`: building blocks (branches, gate, projection head, batch norm)
//! - `sk_attention`: the selective-kernel attention block assembled from them

pub mod modules;
pub mod sk_attention;

pub use modules::{
    BatchNorm2d, BatchNorm2dConfig, Gate, GateConfig, ProjectionHead, ProjectionHeadConfig,
    SkBranch, SkBranchConfig,
};
pub use sk_attention::{SkAttention, SkAttentionOutput, SkAttentionRecord};

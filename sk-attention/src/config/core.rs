//! Core configuration structures for the selective-kernel attention block.
//!
//! All values are fixed when a module is built from the configuration; the
//! resulting module never re-reads them.

use std::{collections::HashSet, path::Path};

use burn::prelude::*;

use crate::error::{SkAttentionError, SkAttentionResult};

/// Construction configuration for [`SkAttention`](crate::SkAttention).
///
/// Defaults follow the DCNet setup: a ResNet-50 stage-4 feature map (2048
/// channels) reduced to 512 channels with dilations 12, 24 and 36.
#[derive(Config, Debug)]
pub struct SkAttentionConfig {
    /// Number of input channels.
    #[config(default = "2048")]
    pub channel_in: usize,
    /// Number of channels produced by every branch and by the fused output.
    #[config(default = "512")]
    pub channel: usize,
    /// Dilation rates of the 3x3 branches, one branch per entry.
    #[config(default = "vec![12, 24, 36]")]
    pub kernels: Vec<usize>,
    /// Reduction factor applied to `channel` to size the gate bottleneck.
    #[config(default = "16")]
    pub reduction: usize,
    /// Number of convolution groups in the branches.
    #[config(default = "1")]
    pub group: usize,
    /// Lower bound on the gate bottleneck size.
    #[config(default = "32")]
    pub min_bottleneck: usize,
    /// Width of the first projection head layer.
    #[config(default = "256")]
    pub projection_hidden: usize,
    /// Width of the projection head output.
    #[config(default = "128")]
    pub projection_out: usize,
    /// Normalization layer settings shared by all branches and the head.
    #[config(default = "NormConfig::new()")]
    pub norm: NormConfig,
    /// Accept an empty `kernels` list, leaving only the 1x1 branch.
    ///
    /// With a single branch the softmax gate is constant 1, so this is off by
    /// default and mostly useful for testing.
    #[config(default = "false")]
    pub allow_single_branch: bool,
}

/// Batch normalization settings.
#[derive(Config, Debug)]
pub struct NormConfig {
    /// Weight of the current batch when updating running statistics.
    #[config(default = 0.1)]
    pub momentum: f64,
    /// Value added to the variance for numerical stability.
    #[config(default = 1e-5)]
    pub epsilon: f64,
}

impl SkAttentionConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Err(SkAttentionError::ConfigIo)` if the file cannot be read or
    /// parsed, and any error [`validate`](Self::validate) reports.
    pub fn from_file(path: impl AsRef<Path>) -> SkAttentionResult<Self> {
        let path = path.as_ref();
        let config = Self::load(path).map_err(|err| SkAttentionError::ConfigIo {
            message: format!("{}: {err}", path.display()),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration and return appropriate errors for invalid settings.
    ///
    /// # Errors
    ///
    /// Returns `Err(SkAttentionError::InvalidConfiguration)` if any validation rule is violated.
    pub fn validate(&self) -> SkAttentionResult<()> {
        // 1. Channel counts
        if self.channel_in == 0 || self.channel == 0 {
            return Err(invalid(format!(
                "channel counts must be positive, got channel_in={} channel={}",
                self.channel_in, self.channel
            )));
        }

        // 2. Grouping constraints of the branch convolutions
        if self.group == 0 {
            return Err(invalid("group must be at least 1".to_string()));
        }
        if self.channel_in % self.group != 0 {
            return Err(invalid(format!(
                "channel_in ({}) must be divisible by group ({})",
                self.channel_in, self.group
            )));
        }
        if self.channel % self.group != 0 {
            return Err(invalid(format!(
                "channel ({}) must be divisible by group ({})",
                self.channel, self.group
            )));
        }

        // 3. Gate bottleneck
        if self.reduction == 0 {
            return Err(invalid("reduction must be at least 1".to_string()));
        }
        if self.bottleneck_dim() == 0 {
            return Err(invalid(format!(
                "bottleneck dimension is zero (channel={}, reduction={}, min_bottleneck={})",
                self.channel, self.reduction, self.min_bottleneck
            )));
        }

        // 4. Dilation rates
        if self.kernels.is_empty() && !self.allow_single_branch {
            return Err(invalid(
                "kernels is empty; set allow_single_branch to use only the 1x1 branch"
                    .to_string(),
            ));
        }
        if self.kernels.contains(&0) {
            return Err(invalid(format!(
                "dilation rates must be positive, got {:?}",
                self.kernels
            )));
        }
        let mut seen = HashSet::with_capacity(self.kernels.len());
        if let Some(duplicate) = self.kernels.iter().find(|&&k| !seen.insert(k)) {
            return Err(invalid(format!(
                "dilation rates must be distinct, {duplicate} appears more than once"
            )));
        }

        // 5. Projection head
        if self.projection_hidden == 0 || self.projection_out == 0 {
            return Err(invalid(format!(
                "projection head widths must be positive, got {} and {}",
                self.projection_hidden, self.projection_out
            )));
        }

        // 6. Normalization
        if !(0.0..=1.0).contains(&self.norm.momentum) {
            return Err(invalid(format!(
                "norm momentum must lie in [0, 1], got {}",
                self.norm.momentum
            )));
        }
        if !(self.norm.epsilon > 0.0 && self.norm.epsilon.is_finite()) {
            return Err(invalid(format!(
                "norm epsilon must be positive, got {}",
                self.norm.epsilon
            )));
        }

        Ok(())
    }

    /// Size of the gate bottleneck: `max(min_bottleneck, channel / reduction)`.
    #[must_use]
    pub fn bottleneck_dim(&self) -> usize {
        self.channel
            .checked_div(self.reduction)
            .unwrap_or(0)
            .max(self.min_bottleneck)
    }

    /// Number of parallel branches, the 1x1 branch included.
    #[must_use]
    pub fn num_branches(&self) -> usize {
        self.kernels.len() + 1
    }
}

fn invalid(reason: String) -> SkAttentionError {
    SkAttentionError::InvalidConfiguration { reason }
}

//! Configuration for the demo binary.
//!
//! A run configuration bundles the attention block's construction config with
//! the synthetic input it is exercised on.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sk_attention::{Mode, SkAttentionConfig};

/// Configuration for a forward-pass demo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Attention block configuration.
    pub model: SkAttentionConfig,
    /// Batch size of the synthetic input.
    pub batch_size: usize,
    /// Height of the synthetic input.
    pub height: usize,
    /// Width of the synthetic input.
    pub width: usize,
    /// Forward mode.
    pub mode: Mode,
    /// Seed for parameter initialization and the synthetic input.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: SkAttentionConfig::new().with_reduction(8),
            batch_size: 2,
            height: 7,
            width: 7,
            mode: Mode::Eval,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Reads a run configuration from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Writes the run configuration as pretty-printed JSON.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_run_config_round_trip() {
        let file = NamedTempFile::new().expect("tempfile");
        let config = RunConfig::default();
        config.save_to_path(file.path()).expect("save");

        let loaded = RunConfig::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.batch_size, config.batch_size);
        assert_eq!(loaded.height, config.height);
        assert_eq!(loaded.mode, config.mode);
        assert_eq!(loaded.model.kernels, config.model.kernels);
        assert_eq!(loaded.model.reduction, 8);
    }

    #[test]
    fn unparsable_file_reports_path() {
        let file = NamedTempFile::new().expect("tempfile");
        fs::write(file.path(), "{ not json").expect("write");

        let err = RunConfig::load_from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}

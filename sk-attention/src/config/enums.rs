//! Enumeration types used by the attention configuration and forward pass.

use burn::prelude::*;

/// Execution mode of a forward pass.
///
/// The mode only affects normalization layers: in [`Mode::Train`] they
/// normalize with the statistics of the current batch and fold them into their
/// running estimates, in [`Mode::Eval`] they normalize with the running
/// estimates and leave them untouched.
#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Batch statistics, running estimates updated.
    Train,
    /// Running estimates, no state mutation.
    Eval,
}

impl Mode {
    /// Returns `true` for [`Mode::Train`].
    #[must_use]
    pub const fn is_train(self) -> bool {
        matches!(self, Self::Train)
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "eval" => Ok(Self::Eval),
            other => Err(format!("unknown mode '{other}', expected 'train' or 'eval'")),
        }
    }
}

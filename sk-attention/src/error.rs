use thiserror::Error;

/// The error type for selective-kernel attention operations.
///
/// Configuration problems are reported when a module is built; shape problems
/// are reported when a forward pass receives an input it cannot process.
#[derive(Error, Debug)]
pub enum SkAttentionError {
    /// Error for when an invalid module configuration is provided.
    /// This can happen if configuration parameters are logically inconsistent.
    #[error("Invalid attention configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Error for when a configuration file cannot be read or parsed.
    #[error("Failed to load configuration: {message}")]
    ConfigIo {
        /// The error message.
        message: String,
    },
}

/// A specialized `Result` type for selective-kernel attention operations.
pub type SkAttentionResult<T> = Result<T, SkAttentionError>;

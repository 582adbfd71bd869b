//! Configuration module for the selective-kernel attention block.
//!
//! - `core`: the construction configuration and its validation rules
//! - `enums`: enumeration types passed alongside the configuration

pub mod core;
pub mod enums;

pub use self::core::{NormConfig, SkAttentionConfig};
pub use self::enums::Mode;

//! Selective-kernel attention demos
//!
//! ## Usage
//!
//! ```bash
//! # Run the block once on random input with the default DCNet setup
//! cargo run --bin sk-attention -- run
//!
//! # Inspect a configuration without running it
//! cargo run --bin sk-attention -- info --config run.json
//!
//! # Write a default configuration to edit
//! cargo run --bin sk-attention -- init-config run.json
//!
//! # Run on the GPU
//! cargo run --bin sk-attention --features wgpu --no-default-features -- run
//! ```

pub mod backend;
pub mod config;
pub mod report;

pub use backend::{create_device, get_backend_name, SelectedBackend, SelectedDevice};
pub use config::RunConfig;
pub use report::{describe, run_forward, ForwardReport, ModelInfo};

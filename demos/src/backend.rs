//! Compile-time backend choice for the demos.
//!
//! `wgpu` wins over the default `ndarray` when both features are enabled.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "wgpu")] {
        pub type SelectedBackend = burn::backend::Wgpu;
        pub type SelectedDevice = burn::backend::wgpu::WgpuDevice;
        const BACKEND_NAME: &str = "WGPU (GPU)";
    } else {
        pub type SelectedBackend = burn::backend::NdArray;
        pub type SelectedDevice = burn::backend::ndarray::NdArrayDevice;
        const BACKEND_NAME: &str = "NdArray (CPU)";
    }
}

/// Default device of [`SelectedBackend`].
pub fn create_device() -> SelectedDevice {
    SelectedDevice::default()
}

/// Human-readable name of [`SelectedBackend`], used in logs and reports.
pub const fn get_backend_name() -> &'static str {
    BACKEND_NAME
}

//! # Spatial Mean
//!
//! Global average pooling that drops the pooled axes, producing one scalar per
//! channel per sample. Unlike `AdaptiveAvgPool2d` the result is a plain 2-D
//! tensor ready to feed a `Linear` layer.

use burn::prelude::*;

/// Averages a `[batch, channels, height, width]` tensor over height and width.
///
/// The spatial axes are flattened and reduced in a single mean, so the result
/// does not depend on the spatial size of the input.
///
/// # Shapes
/// - input: `[batch, channels, height, width]`
/// - output: `[batch, channels]`
pub fn spatial_mean<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 2> {
    let [batch, channels, height, width] = x.dims();

    x.reshape([batch, channels, height * width])
        .mean_dim(2)
        .reshape([batch, channels])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray;
    type TestDevice = NdArrayDevice;

    #[test]
    fn test_spatial_mean_values() {
        let device = TestDevice::default();
        let x = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(
                vec![
                    1.0f32, 2.0, 3.0, 4.0, -1.0, -1.0, -1.0, -1.0, //
                    0.0, 0.0, 0.0, 8.0, 10.0, 20.0, 30.0, 40.0,
                ],
                [2, 2, 2, 2],
            ),
            &device,
        );

        let values = spatial_mean(x).into_data().to_vec::<f32>().unwrap();

        assert_eq!(values, vec![2.5, -1.0, 2.0, 25.0]);
    }

    #[test]
    fn test_spatial_mean_is_size_invariant() {
        let device = TestDevice::default();
        let small = Tensor::<TestBackend, 4>::full([1, 3, 7, 7], 0.25, &device);
        let large = Tensor::<TestBackend, 4>::full([1, 3, 14, 14], 0.25, &device);

        let diff = (spatial_mean(small) - spatial_mean(large))
            .abs()
            .max()
            .into_scalar();

        assert!(diff < 1e-6, "mean should not scale with spatial size");
    }
}

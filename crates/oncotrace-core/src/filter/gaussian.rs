use burn::tensor::backend::Backend;
use burn::tensor::ops::ConvOptions;
use burn::tensor::Tensor;

use crate::image::Image;
use crate::spatial::Spacing3;

/// Gaussian smoothing filter.
///
/// Separable 1-D convolutions, one per axis, with the kernel width derived
/// from the physical sigma and the spacing along that axis. Borders are zero
/// padded.
pub struct GaussianFilter {
    /// Standard deviation in mm along `(x, y, z)`.
    sigmas: [f64; 3],
    max_kernel_width: usize,
}

impl GaussianFilter {
    /// Create a filter with per-axis standard deviations in mm, `(x, y, z)` order.
    pub fn new(sigmas: [f64; 3]) -> Self {
        Self {
            sigmas,
            max_kernel_width: 33,
        }
    }

    /// Same standard deviation on every axis.
    pub fn isotropic(sigma: f64) -> Self {
        Self::new([sigma; 3])
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width.max(1);
        self
    }

    /// Apply the filter to an image. Geometry is unchanged.
    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        let data = self.apply_tensor(image.data().clone(), image.spacing());
        Image::from_parts(data, *image.geometry())
    }

    /// Apply the filter to a `[nz, ny, nx]` tensor with `(x, y, z)` spacing.
    pub fn apply_tensor<B: Backend>(&self, input: Tensor<B, 3>, spacing: &Spacing3) -> Tensor<B, 3> {
        let mut data = input;
        let device = data.device();

        for dim in 0..3 {
            // tensor dim 0 is z, dim 2 is x
            let axis = 2 - dim;
            let sigma = self.sigmas[axis];
            if sigma <= 1e-6 {
                continue;
            }

            let pixel_sigma = sigma / spacing[axis];
            let radius = (3.0 * pixel_sigma).ceil() as usize;
            let width = (2 * radius + 1).min(self.max_kernel_width);
            let actual_radius = (width - 1) / 2;
            if actual_radius == 0 {
                continue;
            }

            let kernel = Self::generate_kernel(pixel_sigma, actual_radius);
            let kernel_tensor = Tensor::<B, 1>::from_floats(kernel.as_slice(), &device);
            data = Self::convolve_1d(data, kernel_tensor, dim);
        }
        data
    }

    fn generate_kernel(sigma: f64, radius: usize) -> Vec<f32> {
        let two_sigma2 = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (0..=2 * radius)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-x * x / two_sigma2).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        raw.into_iter().map(|v| (v / sum) as f32).collect()
    }

    fn convolve_1d<B: Backend>(input: Tensor<B, 3>, kernel: Tensor<B, 1>, dim: usize) -> Tensor<B, 3> {
        let dims = input.dims();

        // Move the target dimension last.
        let permutation: [isize; 3] = match dim {
            0 => [1, 2, 0],
            1 => [0, 2, 1],
            _ => [0, 1, 2],
        };
        let permuted = input.permute(permutation);
        let permuted_dims = permutation.map(|p| dims[p as usize]);

        let length = dims[dim];
        let batch = permuted_dims[0] * permuted_dims[1];
        let kernel_size = kernel.dims()[0];

        let options = ConvOptions::new([1], [kernel_size / 2], [1], 1);
        let output = burn::tensor::module::conv1d(
            permuted.reshape([batch, 1, length]),
            kernel.reshape([1, 1, kernel_size]),
            None,
            options,
        );

        let mut inverse = [0isize; 3];
        for (new_pos, &old_pos) in permutation.iter().enumerate() {
            inverse[old_pos as usize] = new_pos as isize;
        }
        output.reshape(permuted_dims).permute(inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction3, Point3};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn impulse(spacing: [f64; 3]) -> Image<TestBackend> {
        let device = Default::default();
        let mut values = vec![0.0f32; 11 * 11 * 11];
        values[5 * 121 + 5 * 11 + 5] = 1.0;
        Image::from_vec(
            values,
            [11, 11, 11],
            Point3::origin(),
            Spacing3::new(spacing),
            Direction3::identity(),
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let kernel = GaussianFilter::generate_kernel(1.5, 4);
        assert_eq!(kernel.len(), 9);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..4 {
            assert!((kernel[i] - kernel[8 - i]).abs() < 1e-7);
        }
    }

    #[test]
    fn test_smoothing_preserves_mass_away_from_border() {
        let img = impulse([1.0, 1.0, 1.0]);
        let smoothed = GaussianFilter::isotropic(1.0).apply(&img);
        let values = smoothed.to_vec();
        let total: f32 = values.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(values[5 * 121 + 5 * 11 + 5] < 1.0);
        assert_eq!(smoothed.geometry(), img.geometry());
    }

    #[test]
    fn test_spacing_controls_spread_per_axis() {
        // Coarse z spacing: the same physical sigma covers fewer voxels along z.
        let img = impulse([1.0, 1.0, 4.0]);
        let values = GaussianFilter::isotropic(2.0).apply(&img).to_vec();
        let along_x = values[5 * 121 + 5 * 11 + 6];
        let along_z = values[6 * 121 + 5 * 11 + 5];
        assert!(along_x > along_z);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let img = impulse([1.0, 1.0, 1.0]);
        assert_eq!(GaussianFilter::isotropic(0.0).apply(&img).to_vec(), img.to_vec());
    }
}

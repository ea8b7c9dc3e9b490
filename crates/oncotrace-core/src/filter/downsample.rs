use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::image::{GridGeometry, Image};

/// Downsample filter.
///
/// Keeps every `factor`-th voxel along each axis starting at index 0, so the
/// physical position of the first voxel (the origin) is unchanged and the
/// spacing grows by the factor.
pub struct DownsampleFilter {
    /// Factor along `(x, y, z)`.
    factors: [usize; 3],
}

impl DownsampleFilter {
    /// Per-axis factors in `(x, y, z)` order. Factors below 1 act as 1.
    pub fn new(factors: [usize; 3]) -> Self {
        Self {
            factors: factors.map(|f| f.max(1)),
        }
    }

    /// Same factor on every axis.
    pub fn uniform(factor: usize) -> Self {
        Self::new([factor; 3])
    }

    /// Apply the filter to an image.
    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        let mut data = image.data().clone();
        let device = data.device();
        let dims = data.dims();
        let mut spacing = *image.spacing();

        for dim in 0..3 {
            let axis = 2 - dim;
            let factor = self.factors[axis];
            if factor == 1 {
                continue;
            }
            let keep: Vec<i32> = (0..dims[dim]).step_by(factor).map(|i| i as i32).collect();
            let indices = Tensor::<B, 1, Int>::from_ints(keep.as_slice(), &device);
            data = data.select(dim, indices);
            spacing[axis] *= factor as f64;
        }

        let geometry = GridGeometry::new_unchecked(data.dims(), *image.origin(), spacing, *image.direction());
        Image::from_parts(data, geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction3, Point3, Spacing3};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_downsample_shape_and_spacing() {
        let device = Default::default();
        let values: Vec<f32> = (0..(4 * 6 * 10)).map(|v| v as f32).collect();
        let img = Image::<TestBackend>::from_vec(
            values,
            [4, 6, 10],
            Point3::new([1.0, 2.0, 3.0]),
            Spacing3::new([0.5, 1.0, 2.0]),
            Direction3::identity(),
            &device,
        )
        .unwrap();

        let out = DownsampleFilter::new([2, 3, 1]).apply(&img);
        assert_eq!(out.shape(), [4, 2, 5]);
        assert_eq!(out.spacing(), &Spacing3::new([1.0, 3.0, 2.0]));
        assert_eq!(out.origin(), img.origin());

        // Voxel (x 1, y 1, z 0) of the output is (x 2, y 3, z 0) of the input.
        let v = out.to_vec();
        assert_eq!(v[5 + 1], (3 * 10 + 2) as f32);
    }

    #[test]
    fn test_odd_sizes_round_up() {
        let device = Default::default();
        let img = Image::<TestBackend>::from_vec(
            vec![1.0; 5 * 5 * 5],
            [5, 5, 5],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap();
        assert_eq!(DownsampleFilter::uniform(2).apply(&img).shape(), [3, 3, 3]);
    }
}

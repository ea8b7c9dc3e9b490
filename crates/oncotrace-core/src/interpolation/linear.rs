//! Trilinear interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};

use super::trait_::Interpolator;

/// Slack on the grid bounds so points that land on the border through
/// rounding still count as inside.
const BOUNDS_EPSILON: f64 = 1e-3;

/// Trilinear interpolator.
///
/// Differentiable with respect to the sample positions, which is what lets
/// the registration metric back-propagate into transform parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }

    /// `1.0` for indices inside the grid `[0, n - 1]` on every axis, else `0.0`.
    pub fn inside_mask<B: Backend>(shape: [usize; 3], indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [nz, ny, nx] = shape;
        let mut mask = Tensor::<B, 1>::ones([indices.dims()[0]], &indices.device());
        for (column, len) in [(0usize, nx), (1, ny), (2, nz)] {
            let coord = indices.clone().narrow(1, column, 1).squeeze::<1>(1);
            let upper = (len - 1) as f64 + BOUNDS_EPSILON;
            mask = mask
                * coord.clone().greater_equal_elem(-BOUNDS_EPSILON).float()
                * coord.lower_equal_elem(upper).float();
        }
        mask
    }

    /// Interpolate, substituting `default` for indices outside the grid.
    pub fn interpolate_with_default<B: Backend>(
        &self,
        data: &Tensor<B, 3>,
        indices: Tensor<B, 2>,
        default: f32,
    ) -> Tensor<B, 1> {
        let inside = Self::inside_mask(data.dims(), indices.clone());
        let values = self.interpolate(data, indices);
        let outside = inside.clone().neg().add_scalar(1.0);
        values.mul(inside) + outside.mul_scalar(default)
    }
}

/// Lower and upper neighbor along one axis, as flat offsets, with their
/// linear weights.
struct AxisNeighbors<B: Backend> {
    offsets: [Tensor<B, 1, Int>; 2],
    weights: [Tensor<B, 1>; 2],
}

impl<B: Backend> AxisNeighbors<B> {
    fn new(coord: Tensor<B, 1>, len: usize, stride: usize) -> Self {
        let lower = coord.clone().floor();
        let fraction = coord - lower.clone();
        let last = (len - 1) as f64;
        let stride = stride as i32;
        Self {
            offsets: [
                lower.clone().clamp(0.0, last).int() * stride,
                (lower + 1.0).clamp(0.0, last).int() * stride,
            ],
            weights: [fraction.clone().neg().add_scalar(1.0), fraction],
        }
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let flat = data.clone().reshape([nz * ny * nx]);
        let axis = |column: usize, len: usize, stride: usize| {
            AxisNeighbors::new(indices.clone().narrow(1, column, 1).squeeze::<1>(1), len, stride)
        };
        let (x, y, z) = (axis(0, nx, 1), axis(1, ny, nx), axis(2, nz, nx * ny));

        let mut sum = Tensor::<B, 1>::zeros([indices.dims()[0]], &indices.device());
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let offset = x.offsets[i].clone() + y.offsets[j].clone() + z.offsets[k].clone();
                    let weight = x.weights[i].clone() * y.weights[j].clone() * z.weights[k].clone();
                    sum = sum + flat.clone().gather(0, offset) * weight;
                }
            }
        }
        sum
    }
}

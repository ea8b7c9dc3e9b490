//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a `[nz, ny, nx]` volume at continuous `(x, y, z)` indices.
pub trait Interpolator<B: Backend> {
    /// Interpolate values at `indices` (`[Batch, 3]`), returning `[Batch]`.
    ///
    /// Indices outside the grid are clamped to the border.
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}

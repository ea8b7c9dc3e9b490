//! Transform trait for spatial coordinate transformations.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Maps batches of physical points from one space to another.
///
/// Registration transforms map fixed-space points into moving space.
pub trait Transform<B: Backend> {
    /// Apply the transform to a batch of points.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, 3]` containing the input points
    ///
    /// # Returns
    /// Tensor of shape `[Batch, 3]` containing the transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}

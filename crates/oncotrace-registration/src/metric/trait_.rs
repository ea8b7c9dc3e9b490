//! Metric trait for image similarity measurement.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use oncotrace_core::{Image, Transform};

use super::sampling::FixedSamples;

/// Outcome of one metric evaluation.
#[derive(Debug, Clone)]
pub struct MetricValue<B: Backend> {
    /// Scalar cost, lower is better. Differentiable when the transform is.
    pub cost: Tensor<B, 1>,
    /// Fraction of fixed samples that mapped inside the moving grid.
    pub inside_fraction: f64,
}

/// Measures dissimilarity between sampled fixed values and the moving image
/// seen through a transform. Lower values indicate better alignment.
pub trait Metric<B: Backend> {
    /// Evaluate the cost of `transform` (fixed to moving).
    fn evaluate(
        &self,
        fixed: &FixedSamples<B>,
        moving: &Image<B>,
        transform: &impl Transform<B>,
    ) -> MetricValue<B>;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;
}

//! Differentiable joint histogram with Parzen windowing.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Samples per histogram accumulation. Bounds the `[N, bins]` weight
/// matrices held at once.
pub(crate) const CHUNK_SIZE: usize = 32768;

/// Joint histogram calculator using Gaussian Parzen windows.
///
/// Intensities are mapped linearly from their range onto `[0, bins - 1]`;
/// each sample spreads a unit of mass over the bins of each axis.
#[derive(Clone, Debug)]
pub struct ParzenJointHistogram {
    num_bins: usize,
    parzen_sigma: f32,
    fixed_range: (f32, f32),
    moving_range: (f32, f32),
}

impl ParzenJointHistogram {
    /// Create a calculator.
    ///
    /// # Arguments
    /// * `num_bins` - Bins per axis
    /// * `parzen_sigma` - Kernel standard deviation, in bins
    /// * `fixed_range` / `moving_range` - Intensity `(min, max)` of each image
    pub fn new(
        num_bins: usize,
        parzen_sigma: f32,
        fixed_range: (f32, f32),
        moving_range: (f32, f32),
    ) -> Self {
        Self {
            num_bins,
            parzen_sigma,
            fixed_range,
            moving_range,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Per-sample bin weights `[N, bins]`; each row sums to 1.
    fn weights<B: Backend>(&self, values: Tensor<B, 1>, range: (f32, f32)) -> Tensor<B, 2> {
        let device = values.device();
        let [n] = values.dims();
        let top = self.num_bins as f32 - 1.0;
        let extent = (range.1 - range.0).max(f32::EPSILON);

        let normalized = values
            .sub_scalar(range.0)
            .div_scalar(extent)
            .mul_scalar(top)
            .clamp(0.0, top)
            .reshape([n, 1]);

        let bins = Tensor::<B, 1, Int>::arange(0..self.num_bins as i64, &device)
            .float()
            .reshape([1, self.num_bins]);

        let sigma_sq = self.parzen_sigma * self.parzen_sigma;
        let kernel = (normalized - bins).powf_scalar(2.0).mul_scalar(-0.5 / sigma_sq).exp();
        let row_sum = kernel.clone().sum_dim(1).add_scalar(1e-12);
        kernel / row_sum
    }

    /// Unnormalized joint histogram `[bins, bins]` (fixed along rows).
    ///
    /// `sample_weights` scales each sample's contribution; a zero removes it.
    pub fn joint_histogram<B: Backend>(
        &self,
        fixed: Tensor<B, 1>,
        moving: Tensor<B, 1>,
        sample_weights: Tensor<B, 1>,
    ) -> Tensor<B, 2> {
        let device = fixed.device();
        let [n] = fixed.dims();

        let mut joint = Tensor::<B, 2>::zeros([self.num_bins, self.num_bins], &device);
        let mut start = 0;
        while start < n {
            let end = (start + CHUNK_SIZE).min(n);
            let len = end - start;

            let w_fixed = self.weights(fixed.clone().slice([start..end]), self.fixed_range)
                * sample_weights.clone().slice([start..end]).reshape([len, 1]);
            let w_moving = self.weights(moving.clone().slice([start..end]), self.moving_range);

            joint = joint + w_fixed.transpose().matmul(w_moving);
            start = end;
        }
        joint
    }

    /// Negative mutual information `H(F, M) - H(F) - H(M)` of a joint histogram.
    pub fn negative_mutual_information<B: Backend>(joint: Tensor<B, 2>) -> Tensor<B, 1> {
        let total = joint.clone().sum().add_scalar(1e-10);
        let p = joint / total.reshape([1, 1]);

        let p_fixed = p.clone().sum_dim(1);
        let p_moving = p.clone().sum_dim(0);

        Self::entropy(p) - Self::entropy(p_fixed) - Self::entropy(p_moving)
    }

    /// Shannon entropy (nats) of a probability table.
    pub fn entropy<B: Backend, const D: usize>(p: Tensor<B, D>) -> Tensor<B, 1> {
        let eps = 1e-10;
        let log_p = (p.clone() + eps).log();
        p.mul(log_p).sum().neg()
    }
}

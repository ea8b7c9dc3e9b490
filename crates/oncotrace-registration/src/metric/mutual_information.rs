//! Mattes-style mutual information metric.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use oncotrace_core::interpolation::{Interpolator, LinearInterpolator};
use oncotrace_core::{Image, Transform};

use super::histogram::{ParzenJointHistogram, CHUNK_SIZE};
use super::sampling::FixedSamples;
use super::trait_::{Metric, MetricValue};

/// Mutual information between fixed samples and the transformed moving image.
///
/// The cost is `-MI = H(F, M) - H(F) - H(M)`, so lower is better. Samples
/// that map outside the moving grid carry no weight in the joint histogram.
#[derive(Clone, Debug)]
pub struct MutualInformation {
    interpolator: LinearInterpolator,
    histogram: ParzenJointHistogram,
}

impl MutualInformation {
    /// Create a new metric.
    ///
    /// # Arguments
    /// * `num_bins` - Histogram bins per axis
    /// * `parzen_sigma_bins` - Parzen kernel width in bins
    /// * `fixed_range` / `moving_range` - Intensity `(min, max)` of each image
    pub fn new(
        num_bins: usize,
        parzen_sigma_bins: f64,
        fixed_range: (f64, f64),
        moving_range: (f64, f64),
    ) -> Self {
        Self {
            interpolator: LinearInterpolator::new(),
            histogram: ParzenJointHistogram::new(
                num_bins,
                parzen_sigma_bins as f32,
                (fixed_range.0 as f32, fixed_range.1 as f32),
                (moving_range.0 as f32, moving_range.1 as f32),
            ),
        }
    }

    /// Metric with intensity ranges taken from the two images.
    pub fn for_images<B: Backend>(
        fixed: &Image<B>,
        moving: &Image<B>,
        num_bins: usize,
        parzen_sigma_bins: f64,
    ) -> Self {
        Self::new(
            num_bins,
            parzen_sigma_bins,
            fixed.intensity_range(),
            moving.intensity_range(),
        )
    }

    pub fn num_bins(&self) -> usize {
        self.histogram.num_bins()
    }
}

impl<B: Backend> Metric<B> for MutualInformation {
    fn evaluate(
        &self,
        fixed: &FixedSamples<B>,
        moving: &Image<B>,
        transform: &impl Transform<B>,
    ) -> MetricValue<B> {
        let n = fixed.len();
        let device = fixed.values().device();
        let bins = self.histogram.num_bins();
        let moving_shape = moving.shape();

        let mut joint = Tensor::<B, 2>::zeros([bins, bins], &device);
        let mut inside_count = 0.0f64;

        let mut start = 0;
        while start < n {
            let end = (start + CHUNK_SIZE).min(n);

            let points = fixed.points().clone().slice([start..end, 0..3]);
            let fixed_values = fixed.values().clone().slice([start..end]);

            let mapped = transform.transform_points(points);
            let indices = moving.world_to_index_tensor(mapped);
            let inside = LinearInterpolator::inside_mask(moving_shape, indices.clone());
            let moving_values = self.interpolator.interpolate(moving.data(), indices);

            inside_count += inside.clone().sum().into_scalar().elem::<f64>();
            joint = joint + self.histogram.joint_histogram(fixed_values, moving_values, inside);
            start = end;
        }

        let inside_fraction = if n == 0 { 0.0 } else { inside_count / n as f64 };

        MetricValue {
            cost: ParzenJointHistogram::negative_mutual_information(joint),
            inside_fraction,
        }
    }

    fn name(&self) -> &'static str {
        "MutualInformation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use oncotrace_core::spatial::{Direction3, Point3, Spacing3, Vector3};
    use oncotrace_core::RigidTransform;
    use oncotrace_core::VersorRigid3DTransform;

    type B = NdArray<f32>;

    fn blob(center: [f64; 3]) -> Image<B> {
        let n = 16;
        let mut values = Vec::with_capacity(n * n * n);
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let d2 = (x as f64 - center[0]).powi(2)
                        + (y as f64 - center[1]).powi(2)
                        + (z as f64 - center[2]).powi(2);
                    values.push((100.0 * (-d2 / 18.0).exp()) as f32);
                }
            }
        }
        Image::from_vec(
            values,
            [n, n, n],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &Default::default(),
        )
        .unwrap()
    }

    fn cost_at(metric: &MutualInformation, fixed: &Image<B>, moving: &Image<B>, shift: [f64; 3]) -> (f32, f64) {
        let samples = FixedSamples::new(fixed, 1);
        let rigid = RigidTransform::from_translation(Vector3::new(shift), fixed.physical_center());
        let transform = VersorRigid3DTransform::<B>::from_rigid(&rigid, &Default::default());
        let value = metric.evaluate(&samples, moving, &transform);
        (value.cost.into_scalar(), value.inside_fraction)
    }

    #[test]
    fn test_identical_images_have_negative_cost() {
        let image = blob([7.5, 7.5, 7.5]);
        let metric = MutualInformation::for_images(&image, &image, 32, 1.0);
        let (cost, inside) = cost_at(&metric, &image, &image, [0.0; 3]);
        assert!(cost < 0.0);
        assert!((inside - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_misalignment_increases_cost() {
        let fixed = blob([7.5, 7.5, 7.5]);
        let moving = blob([9.5, 7.5, 7.5]);
        let metric = MutualInformation::for_images(&fixed, &moving, 32, 1.0);

        let (aligned, _) = cost_at(&metric, &fixed, &moving, [2.0, 0.0, 0.0]);
        let (off, _) = cost_at(&metric, &fixed, &moving, [-2.0, 0.0, 0.0]);
        assert!(aligned < off, "aligned {} vs misaligned {}", aligned, off);
    }

    #[test]
    fn test_inside_fraction_drops_with_large_shift() {
        let image = blob([7.5, 7.5, 7.5]);
        let metric = MutualInformation::for_images(&image, &image, 16, 1.0);
        let (_, inside) = cost_at(&metric, &image, &image, [8.0, 0.0, 0.0]);
        assert!(inside > 0.3 && inside < 0.7, "inside fraction {}", inside);
    }
}

//! Post-registration alignment quality.

use burn::tensor::backend::Backend;
use oncotrace_core::filter::resample_onto;
use oncotrace_core::{Image, RigidTransform};

/// Pearson correlation between `fixed` and `moving` resampled through
/// `transform`, over voxels where both are strictly positive.
///
/// Returns 0 when fewer than two voxels qualify or either side has no variance.
pub fn alignment_quality<B: Backend>(
    fixed: &Image<B>,
    moving: &Image<B>,
    transform: &RigidTransform,
) -> f64 {
    let resampled = resample_onto(moving, fixed.geometry(), transform);
    resampled_correlation(fixed, &resampled)
}

/// Pearson correlation over jointly positive voxels of two images on the
/// same grid, such as `fixed` and a moving image already resampled onto it.
pub fn resampled_correlation<B: Backend>(fixed: &Image<B>, resampled: &Image<B>) -> f64 {
    pearson_over_positive(&fixed.to_vec(), &resampled.to_vec())
}

fn pearson_over_positive(a: &[f32], b: &[f32]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| **x > 0.0 && **y > 0.0)
        .map(|(x, y)| (f64::from(*x), f64::from(*y)))
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    cov / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use oncotrace_core::spatial::{Direction3, Point3, Spacing3};

    type B = NdArray<f32>;

    #[test]
    fn test_pearson_cases() {
        assert!((pearson_over_positive(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson_over_positive(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        // zeros are excluded, leaving a single pair
        assert_eq!(pearson_over_positive(&[0.0, 1.0, 0.0], &[1.0, 1.0, 1.0]), 0.0);
        assert_eq!(pearson_over_positive(&[1.0, 1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_identity_quality_is_one() {
        let values: Vec<f32> = (0..125).map(|v| 1.0 + (v % 7) as f32).collect();
        let image = Image::<B>::from_vec(
            values,
            [5, 5, 5],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &Default::default(),
        )
        .unwrap();
        let q = alignment_quality(&image, &image, &RigidTransform::identity(image.physical_center()));
        assert!((q - 1.0).abs() < 1e-5);
    }
}

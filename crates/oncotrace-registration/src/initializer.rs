//! Starting transforms for registration.

use burn::tensor::backend::Backend;
use oncotrace_core::{Image, RigidTransform};
use tracing::{debug, warn};

use crate::config::TransformInitialization;

/// Build the starting transform for `fixed` and `moving`.
pub fn initial_transform<B: Backend>(
    strategy: TransformInitialization,
    fixed: &Image<B>,
    moving: &Image<B>,
) -> RigidTransform {
    match strategy {
        TransformInitialization::Identity => RigidTransform::identity(fixed.physical_center()),
        TransformInitialization::Moments => moments_transform(fixed, moving),
    }
}

/// Translation that carries the fixed intensity centroid onto the moving one,
/// rotating about the fixed centroid.
///
/// Falls back to the geometric centers when either volume has no positive mass.
pub fn moments_transform<B: Backend>(fixed: &Image<B>, moving: &Image<B>) -> RigidTransform {
    match (fixed.center_of_mass(), moving.center_of_mass()) {
        (Some(fixed_com), Some(moving_com)) => {
            let translation = moving_com - fixed_com;
            debug!(
                tx = translation[0],
                ty = translation[1],
                tz = translation[2],
                "Moments initialization"
            );
            RigidTransform::from_translation(translation, fixed_com)
        }
        _ => {
            warn!("Center of mass undefined, initializing from geometric centers");
            let center = fixed.physical_center();
            RigidTransform::from_translation(moving.physical_center() - center, center)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use oncotrace_core::spatial::{Direction3, Point3, Spacing3};

    type B = NdArray<f32>;

    fn point_image(hot: [usize; 3], origin: [f64; 3]) -> Image<B> {
        let n = 8;
        let mut values = vec![0.0f32; n * n * n];
        values[(hot[2] * n + hot[1]) * n + hot[0]] = 1.0;
        Image::from_vec(
            values,
            [n, n, n],
            Point3::new(origin),
            Spacing3::uniform(2.0),
            Direction3::identity(),
            &Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_identity_rotates_about_fixed_center() {
        let fixed = point_image([1, 1, 1], [0.0; 3]);
        let t = initial_transform(TransformInitialization::Identity, &fixed, &fixed);
        assert_eq!(t.translation().norm(), 0.0);
        assert_eq!(t.center().to_array(), [7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_moments_maps_centroid_to_centroid() {
        let fixed = point_image([1, 2, 3], [0.0; 3]);
        let moving = point_image([4, 2, 3], [10.0, 0.0, 0.0]);
        let t = moments_transform(&fixed, &moving);

        let fixed_com = fixed.center_of_mass().unwrap();
        let mapped = t.transform_point(&fixed_com);
        let moving_com = moving.center_of_mass().unwrap();
        assert!(mapped.distance(&moving_com) < 1e-9);
        assert_eq!(t.translation().to_array(), [16.0, 0.0, 0.0]);
    }

    #[test]
    fn test_moments_falls_back_without_mass() {
        let empty = Image::<B>::from_vec(
            vec![0.0; 8],
            [2, 2, 2],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &Default::default(),
        )
        .unwrap();
        let t = moments_transform(&empty, &empty);
        assert_eq!(t.translation().norm(), 0.0);
    }
}

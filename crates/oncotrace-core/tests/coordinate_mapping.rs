use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use nalgebra::{Rotation3, Vector3 as NaVector3};
use oncotrace_core::image::Image;
use oncotrace_core::spatial::{Direction3, Point3, Spacing3};
use proptest::prelude::*;

type Backend = NdArray<f32>;

fn make_rotation(ax: f64, ay: f64, az: f64) -> Direction3 {
    let r = Rotation3::from_axis_angle(&NaVector3::x_axis(), ax)
        * Rotation3::from_axis_angle(&NaVector3::y_axis(), ay)
        * Rotation3::from_axis_angle(&NaVector3::z_axis(), az);
    Direction3(r.into_inner())
}

fn make_image(origin: [f64; 3], spacing: [f64; 3], direction: Direction3) -> Image<Backend> {
    let device = Default::default();
    Image::try_new(
        Tensor::<Backend, 3>::zeros([2, 2, 2], &device),
        Point3::new(origin),
        Spacing3::new(spacing),
        direction,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn test_coordinate_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14,
        px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0
    ) {
        let image = make_image([ox, oy, oz], [sx, sy, sz], make_rotation(ax, ay, az));
        let point = Point3::new([px, py, pz]);

        let index = image.transform_physical_point_to_continuous_index(&point);
        let recovered = image.transform_continuous_index_to_physical_point(&index);

        prop_assert!(point.distance(&recovered) < 1e-6, "{:?} vs {:?}", point, recovered);
    }

    #[test]
    fn test_tensor_mapping_matches_host(
        ox in -20.0f64..20.0, oy in -20.0f64..20.0, oz in -20.0f64..20.0,
        sx in 0.5f64..3.0, sy in 0.5f64..3.0, sz in 0.5f64..3.0,
        ax in -1.5f64..1.5, az in -1.5f64..1.5,
        ix in 0.0f64..30.0, iy in 0.0f64..30.0, iz in 0.0f64..30.0
    ) {
        let device = Default::default();
        let image = make_image([ox, oy, oz], [sx, sy, sz], make_rotation(ax, 0.0, az));

        let expected = image.transform_continuous_index_to_physical_point(&Point3::new([ix, iy, iz]));
        let indices = Tensor::<Backend, 2>::from_floats([[ix as f32, iy as f32, iz as f32]], &device);

        let world = image.index_to_world_tensor(indices);
        let world_values: Vec<f32> = world.clone().into_data().iter::<f32>().collect();
        for axis in 0..3 {
            prop_assert!((world_values[axis] as f64 - expected[axis]).abs() < 1e-3);
        }

        let back: Vec<f32> = image.world_to_index_tensor(world).into_data().iter::<f32>().collect();
        prop_assert!((back[0] as f64 - ix).abs() < 1e-3);
        prop_assert!((back[1] as f64 - iy).abs() < 1e-3);
        prop_assert!((back[2] as f64 - iz).abs() < 1e-3);
    }
}

//! Resample image filter.
//!
//! Samples an input image on the grid of a reference geometry through a
//! transform that maps reference-space points into input space. Registration
//! transforms map fixed to moving, so resampling the moving volume with the
//! registration result lands it on the fixed grid.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor};

use crate::image::{generate_grid_3d, GridGeometry, Image};
use crate::interpolation::{Interpolator, LinearInterpolator};
use crate::transform::{RigidTransform, Transform, VersorRigid3DTransform};

/// Number of output voxels mapped per batch.
const CHUNK_VOXELS: usize = 1 << 20;

/// Resample image filter.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - Transform from output space to input space
/// * `I` - The interpolator
pub struct ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    output: GridGeometry,
    transform: T,
    interpolator: I,
    default_pixel_value: f32,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    /// Create a filter producing images on `output`.
    pub fn new(output: GridGeometry, transform: T, interpolator: I) -> Self {
        Self {
            output,
            transform,
            interpolator,
            default_pixel_value: 0.0,
            _phantom: PhantomData,
        }
    }

    /// Value for output voxels that map outside the input grid.
    pub fn with_default_pixel_value(mut self, value: f32) -> Self {
        self.default_pixel_value = value;
        self
    }

    /// Apply the filter to an input image.
    pub fn apply(&self, input: &Image<B>) -> Image<B> {
        let device = input.data().device();
        let [nz, ny, nx] = self.output.shape();
        let slab = (CHUNK_VOXELS / (ny * nx)).max(1);

        let mut chunks = Vec::with_capacity(nz.div_ceil(slab));
        let mut z_start = 0;
        while z_start < nz {
            let depth = slab.min(nz - z_start);
            let mut indices = generate_grid_3d::<B>([depth, ny, nx], &device);
            if z_start > 0 {
                let offset = Tensor::<B, 1>::from_floats([0.0, 0.0, z_start as f32], &device).reshape([1, 3]);
                indices = indices + offset;
            }
            chunks.push(self.sample(input, indices));
            z_start += depth;
        }

        let data = Tensor::cat(chunks, 0).reshape(Shape::new([nz, ny, nx]));
        Image::from_parts(data, self.output)
    }

    fn sample(&self, input: &Image<B>, output_indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let physical = index_to_world(&self.output, output_indices);
        let input_indices = input.world_to_index_tensor(self.transform.transform_points(physical));

        let inside = LinearInterpolator::inside_mask(input.shape(), input_indices.clone());
        let values = self.interpolator.interpolate(input.data(), input_indices);
        let outside = inside.clone().neg().add_scalar(1.0);
        values.mul(inside) + outside.mul_scalar(self.default_pixel_value)
    }
}

fn index_to_world<B: Backend>(geometry: &GridGeometry, indices: Tensor<B, 2>) -> Tensor<B, 2> {
    let device = indices.device();
    // Point = Origin + (Index * Spacing) @ D^T
    let spacing = Tensor::<B, 1>::from_floats(
        geometry.spacing().to_array().map(|s| s as f32),
        &device,
    )
    .reshape([1, 3]);
    let direction = geometry.direction();
    let mut dir_t = [[0.0f32; 3]; 3];
    for (r, row) in dir_t.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = direction[(c, r)] as f32;
        }
    }
    let dir_t = Tensor::<B, 2>::from_floats(dir_t, &device);
    let origin = Tensor::<B, 1>::from_floats(geometry.origin().to_f32_array(), &device).reshape([1, 3]);

    (indices * spacing).matmul(dir_t) + origin
}

/// Resample `moving` onto `reference` through a fixed-to-moving rigid
/// transform, with trilinear interpolation and 0 outside the moving grid.
pub fn resample_onto<B: Backend>(
    moving: &Image<B>,
    reference: &GridGeometry,
    transform: &RigidTransform,
) -> Image<B> {
    let device = moving.data().device();
    let tensor_transform = VersorRigid3DTransform::<B>::from_rigid(transform, &device);
    ResampleImageFilter::new(*reference, tensor_transform, LinearInterpolator::new()).apply(moving)
}

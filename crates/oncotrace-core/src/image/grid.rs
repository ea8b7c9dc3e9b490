use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

/// Generate continuous indices for every voxel of a 3-D shape.
///
/// Returns a tensor of shape `[N, 3]` whose rows are `(x, y, z)` indices,
/// ordered like the flattened `[nz, ny, nx]` tensor.
pub fn generate_grid_3d<B>(shape: [usize; 3], device: &B::Device) -> Tensor<B, 2>
where
    B: Backend,
{
    generate_strided_grid_3d(shape, 1, device)
}

/// Generate continuous indices for every `stride`-th voxel along each axis.
///
/// A stride of 1 yields the full grid. Used to subsample the fixed volume
/// when evaluating the registration metric.
pub fn generate_strided_grid_3d<B>(
    shape: [usize; 3],
    stride: usize,
    device: &B::Device,
) -> Tensor<B, 2>
where
    B: Backend,
{
    let stride = stride.max(1);
    let [d, h, w] = shape;

    let mut grid = Vec::with_capacity(d.div_ceil(stride) * h.div_ceil(stride) * w.div_ceil(stride) * 3);
    for z in (0..d).step_by(stride) {
        for y in (0..h).step_by(stride) {
            for x in (0..w).step_by(stride) {
                grid.push(x as f32);
                grid.push(y as f32);
                grid.push(z as f32);
            }
        }
    }

    let total = grid.len() / 3;
    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * 3])), device)
        .reshape([total, 3])
}

//! Fixed-image samples shared by every metric evaluation of a level.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Shape, Tensor, TensorData};
use oncotrace_core::image::generate_strided_grid_3d;
use oncotrace_core::Image;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Physical positions and intensities of the fixed voxels used as samples.
///
/// Computed once per resolution level; only the moving side changes between
/// iterations.
#[derive(Debug, Clone)]
pub struct FixedSamples<B: Backend> {
    points: Tensor<B, 2>,
    values: Tensor<B, 1>,
    len: usize,
}

impl<B: Backend> FixedSamples<B> {
    /// Take every `stride`-th voxel along each axis of `fixed`.
    pub fn new(fixed: &Image<B>, stride: usize) -> Self {
        let device = fixed.data().device();
        let shape = fixed.shape();
        let stride = stride.max(1);

        let indices = generate_strided_grid_3d::<B>(shape, stride, &device);
        let len = indices.dims()[0];
        let points = fixed.index_to_world_tensor(indices);

        let flat_data = fixed.data().clone().reshape([fixed.num_voxels()]);
        let values = if stride == 1 {
            flat_data
        } else {
            let [d, h, w] = shape;
            let mut flat = Vec::with_capacity(len);
            for z in (0..d).step_by(stride) {
                for y in (0..h).step_by(stride) {
                    for x in (0..w).step_by(stride) {
                        flat.push(((z * h + y) * w + x) as i64);
                    }
                }
            }
            let idx = Tensor::<B, 1, Int>::from_data(TensorData::new(flat, Shape::new([len])), &device);
            flat_data.select(0, idx)
        };

        Self { points, values, len }
    }

    /// Keep `count` samples chosen uniformly at random with `seed`.
    ///
    /// The kept samples stay in grid order. Nothing changes when `count`
    /// covers every sample.
    pub fn subsample(self, count: usize, seed: u64) -> Self {
        if count >= self.len {
            return self;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = rand::seq::index::sample(&mut rng, self.len, count).into_vec();
        picked.sort_unstable();

        let device = self.values.device();
        let picked: Vec<i64> = picked.into_iter().map(|i| i as i64).collect();
        let idx = Tensor::<B, 1, Int>::from_data(TensorData::new(picked, Shape::new([count])), &device);
        Self {
            points: self.points.select(0, idx.clone()),
            values: self.values.select(0, idx),
            len: count,
        }
    }

    /// Physical positions, `[N, 3]`.
    pub fn points(&self) -> &Tensor<B, 2> {
        &self.points
    }

    /// Fixed intensities, `[N]`.
    pub fn values(&self) -> &Tensor<B, 1> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

//! Volume type with physical metadata and coordinate transformations.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Shape, Tensor, TensorData};

use super::geometry::GridGeometry;
use crate::error::{ImageError, Result};
use crate::spatial::{Direction3, Point3, Spacing3};

/// 3-D scalar volume with physical metadata.
///
/// Combines tensor data of shape `[nz, ny, nx]` with the geometry that maps
/// voxel indices to physical coordinates. Images are immutable; filters
/// return new images.
///
/// # Coordinate Systems
/// * **Index Space**: continuous voxel indices in `(x, y, z)` order
/// * **Physical Space**: continuous coordinates in mm
///
/// # Examples
/// ```rust
/// use oncotrace_core::Image;
/// use oncotrace_core::spatial::{Direction3, Point3, Spacing3};
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let image = Image::<Backend>::from_vec(
///     vec![0.0; 1000],
///     [10, 10, 10],
///     Point3::origin(),
///     Spacing3::uniform(1.0),
///     Direction3::identity(),
///     &device,
/// )
/// .unwrap();
/// assert_eq!(image.shape(), [10, 10, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend> {
    data: Tensor<B, 3>,
    geometry: GridGeometry,
}

/// The volume type exchanged between pipeline stages.
pub type VolumeGrid<B> = Image<B>;

impl<B: Backend> Image<B> {
    /// Create an image from an existing tensor, validating the metadata.
    pub fn try_new(
        data: Tensor<B, 3>,
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Result<Self> {
        let geometry = GridGeometry::new(data.dims(), origin, spacing, direction)?;
        Ok(Self { data, geometry })
    }

    /// Create an image from flattened values in `[nz, ny, nx]` order.
    ///
    /// This is the entry point for loaders that hand over a raw voxel buffer.
    pub fn from_vec(
        values: Vec<f32>,
        shape: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
        device: &B::Device,
    ) -> Result<Self> {
        let geometry = GridGeometry::new(shape, origin, spacing, direction)?;
        Self::from_vec_with_geometry(values, geometry, device)
    }

    /// Create an image from flattened values laid out on `geometry`.
    pub fn from_vec_with_geometry(
        values: Vec<f32>,
        geometry: GridGeometry,
        device: &B::Device,
    ) -> Result<Self> {
        let expected = geometry.num_voxels();
        if values.len() != expected {
            return Err(ImageError::DataLengthMismatch {
                shape: geometry.shape(),
                expected,
                actual: values.len(),
            });
        }
        let data = Tensor::from_data(TensorData::new(values, Shape::new(geometry.shape())), device);
        Ok(Self { data, geometry })
    }

    /// Wrap a tensor whose shape already equals `geometry.shape()`.
    ///
    /// Used by filters that preserve or recompute geometry themselves.
    pub fn from_tensor(data: Tensor<B, 3>, geometry: GridGeometry) -> Result<Self> {
        let dims = data.dims();
        if dims != geometry.shape() {
            return Err(ImageError::DataLengthMismatch {
                shape: geometry.shape(),
                expected: geometry.num_voxels(),
                actual: dims.iter().product(),
            });
        }
        Ok(Self { data, geometry })
    }

    /// Pair a tensor with a geometry already known to match its shape.
    pub(crate) fn from_parts(data: Tensor<B, 3>, geometry: GridGeometry) -> Self {
        debug_assert_eq!(data.dims(), geometry.shape());
        Self { data, geometry }
    }

    /// Get the voxel data tensor.
    pub fn data(&self) -> &Tensor<B, 3> {
        &self.data
    }

    /// Consume the image, returning its tensor.
    pub fn into_data(self) -> Tensor<B, 3> {
        self.data
    }

    /// Get the grid geometry.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Get the origin (physical coordinate of voxel `(0, 0, 0)`).
    pub fn origin(&self) -> &Point3 {
        self.geometry.origin()
    }

    /// Get the spacing in `(x, y, z)` order.
    pub fn spacing(&self) -> &Spacing3 {
        self.geometry.spacing()
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction3 {
        self.geometry.direction()
    }

    /// Get the tensor shape `[nz, ny, nx]`.
    pub fn shape(&self) -> [usize; 3] {
        self.geometry.shape()
    }

    pub fn num_voxels(&self) -> usize {
        self.geometry.num_voxels()
    }

    /// Volume of one voxel in mm³.
    pub fn voxel_volume(&self) -> f64 {
        self.geometry.voxel_volume()
    }

    /// Physical position of the grid center.
    pub fn physical_center(&self) -> Point3 {
        self.geometry.physical_center()
    }

    /// Copy the voxel values to the host in `[nz, ny, nx]` order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone().into_data().iter::<f32>().collect()
    }

    /// Minimum and maximum intensity.
    pub fn intensity_range(&self) -> (f64, f64) {
        let min = self.data.clone().min().into_scalar().elem::<f64>();
        let max = self.data.clone().max().into_scalar().elem::<f64>();
        (min, max)
    }

    /// Intensity-weighted physical centroid.
    ///
    /// Returns `None` when the intensities do not sum to a positive value.
    pub fn center_of_mass(&self) -> Option<Point3> {
        let values = self.to_vec();
        let [nx, ny, _] = self.geometry.size_xyz();
        let mut total = 0.0f64;
        let mut acc = [0.0f64; 3];
        for (flat, &v) in values.iter().enumerate() {
            if v <= 0.0 {
                continue;
            }
            let v = v as f64;
            let x = flat % nx;
            let y = (flat / nx) % ny;
            let z = flat / (nx * ny);
            acc[0] += v * x as f64;
            acc[1] += v * y as f64;
            acc[2] += v * z as f64;
            total += v;
        }
        if total <= 0.0 {
            return None;
        }
        Some(self.geometry.index_to_physical([acc[0] / total, acc[1] / total, acc[2] / total]))
    }

    /// Convert a physical point to a continuous index.
    ///
    /// `index = (Direction^T * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point3) -> Point3 {
        Point3::new(self.geometry.physical_to_index(point))
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point3) -> Point3 {
        self.geometry.index_to_physical(index.to_array())
    }

    /// Batch transform physical points to continuous indices.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, 3]` containing physical points
    ///
    /// # Returns
    /// Tensor of shape `[Batch, 3]` containing continuous `(x, y, z)` indices
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let origin = self.origin_tensor(&device);

        // I = (P - O) @ T with T[r, c] = D[r, c] / S[c] (D orthonormal, so D^-1 = D^T).
        let direction = self.direction();
        let spacing = self.spacing();
        let mut t_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                t_data.push((direction[(r, c)] / spacing[c]) as f32);
            }
        }
        let t = Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([3, 3])), &device);

        (points - origin).matmul(t)
    }

    /// Batch transform continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - Tensor of shape `[Batch, 3]` containing `(x, y, z)` indices
    ///
    /// # Returns
    /// Tensor of shape `[Batch, 3]` containing physical points
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();
        let origin = self.origin_tensor(&device);

        // P = O + I @ M with M[r, c] = S[r] * D[c, r]
        let direction = self.direction();
        let spacing = self.spacing();
        let mut m_data = Vec::with_capacity(9);
        for r in 0..3 {
            for c in 0..3 {
                m_data.push((spacing[r] * direction[(c, r)]) as f32);
            }
        }
        let m = Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([3, 3])), &device);

        indices.matmul(m) + origin
    }

    fn origin_tensor(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.origin().to_f32_array(), device).reshape([1, 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;

    fn image(origin: [f64; 3], spacing: [f64; 3]) -> Image<Backend> {
        let device = Default::default();
        Image::try_new(
            Tensor::<Backend, 3>::zeros([10, 10, 10], &device),
            Point3::new(origin),
            Spacing3::new(spacing),
            Direction3::identity(),
        )
        .unwrap()
    }

    #[test]
    fn test_image_creation() {
        let img = image([0.0; 3], [1.0; 3]);
        assert_eq!(img.shape(), [10, 10, 10]);
        assert_eq!(img.origin(), &Point3::origin());
        assert_eq!(img.spacing(), &Spacing3::uniform(1.0));
        assert_eq!(img.direction(), &Direction3::identity());
        assert_eq!(img.voxel_volume(), 1.0);
    }

    #[test]
    fn test_from_vec_validates_length() {
        let device = Default::default();
        let err = Image::<Backend>::from_vec(
            vec![1.0; 7],
            [2, 2, 2],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ImageError::DataLengthMismatch {
                shape: [2, 2, 2],
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_try_new_rejects_bad_spacing() {
        let device = Default::default();
        let result = Image::try_new(
            Tensor::<Backend, 3>::zeros([2, 2, 2], &device),
            Point3::origin(),
            Spacing3::new([1.0, -1.0, 1.0]),
            Direction3::identity(),
        );
        assert!(matches!(result, Err(ImageError::InvalidSpacing { .. })));
    }

    #[test]
    fn test_physical_to_index_transform() {
        let img = image([10.0, 20.0, 30.0], [2.0, 2.0, 2.0]);
        let index = img.transform_physical_point_to_continuous_index(&Point3::new([20.0, 30.0, 40.0]));
        for axis in 0..3 {
            assert!((index[axis] - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_roundtrip() {
        let img = image([1.0, -2.0, 3.0], [0.5, 1.5, 2.5]);
        let original = Point3::new([3.5, 4.5, 5.5]);
        let index = img.transform_physical_point_to_continuous_index(&original);
        let back = img.transform_continuous_index_to_physical_point(&index);
        assert!(original.distance(&back) < 1e-9);
    }

    #[test]
    fn test_to_vec_preserves_order() {
        let device = Default::default();
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let img = Image::<Backend>::from_vec(
            values.clone(),
            [2, 3, 4],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap();
        assert_eq!(img.to_vec(), values);
        assert_eq!(img.intensity_range(), (0.0, 23.0));
    }

    #[test]
    fn test_center_of_mass() {
        let device = Default::default();
        let mut values = vec![0.0f32; 27];
        // Voxel (x 2, y 1, z 0) in a 3x3x3 grid.
        values[3 + 2] = 4.0;
        let img = Image::<Backend>::from_vec(
            values,
            [3, 3, 3],
            Point3::new([1.0, 1.0, 1.0]),
            Spacing3::new([2.0, 1.0, 1.0]),
            Direction3::identity(),
            &device,
        )
        .unwrap();
        let com = img.center_of_mass().unwrap();
        assert!(com.distance(&Point3::new([5.0, 2.0, 1.0])) < 1e-9);

        let empty = Image::<Backend>::from_vec(
            vec![0.0; 27],
            [3, 3, 3],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &device,
        )
        .unwrap();
        assert!(empty.center_of_mass().is_none());
    }
}

//! Binary voxel masks bound to the geometry of their source volume.

use burn::tensor::backend::Backend;
use burn::tensor::{Bool, ElementConversion, Shape, Tensor, TensorData};

use crate::error::{ImageError, Result};
use crate::image::GridGeometry;

/// Boolean voxel grid carrying the exact geometry of the volume it came from.
#[derive(Debug, Clone)]
pub struct BinaryMask<B: Backend> {
    data: Tensor<B, 3, Bool>,
    geometry: GridGeometry,
}

impl<B: Backend> BinaryMask<B> {
    /// Wrap a boolean tensor. Its shape must equal `geometry.shape()`.
    pub fn new(data: Tensor<B, 3, Bool>, geometry: GridGeometry) -> Result<Self> {
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

    /// Build a mask from flattened flags in `[nz, ny, nx]` order.
    pub fn from_vec(values: Vec<bool>, geometry: GridGeometry, device: &B::Device) -> Result<Self> {
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

    /// All-background mask on `geometry`.
    pub fn empty(geometry: GridGeometry, device: &B::Device) -> Self {
        let data = Tensor::<B, 3, burn::tensor::Int>::zeros(geometry.shape(), device).equal_elem(1);
        Self { data, geometry }
    }

    pub fn data(&self) -> &Tensor<B, 3, Bool> {
        &self.data
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Tensor shape `[nz, ny, nx]`.
    pub fn shape(&self) -> [usize; 3] {
        self.geometry.shape()
    }

    /// Number of foreground voxels.
    pub fn count(&self) -> usize {
        self.data.clone().int().sum().into_scalar().elem::<i64>() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Foreground volume in mm³.
    pub fn volume_mm3(&self) -> f64 {
        self.count() as f64 * self.geometry.voxel_volume()
    }

    /// Copy the flags to the host in `[nz, ny, nx]` order.
    pub fn to_vec(&self) -> Vec<bool> {
        self.data
            .clone()
            .int()
            .into_data()
            .iter::<i64>()
            .map(|v| v != 0)
            .collect()
    }
}

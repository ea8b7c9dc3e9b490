//! Physical geometry of a voxel grid.
//!
//! A [`GridGeometry`] is everything about a volume except its values: the
//! tensor shape plus the origin, spacing and direction that map voxel indices
//! to physical coordinates. Masks and change maps carry the geometry of the
//! volume they were derived from.

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};
use crate::spatial::{Direction3, Point3, Spacing3, Vector3};

/// Shape and physical placement of a 3-D voxel grid.
///
/// `shape` is in tensor order `[nz, ny, nx]`; origin, spacing and direction
/// are in physical `(x, y, z)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    shape: [usize; 3],
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
}

impl GridGeometry {
    /// Create a geometry, validating shape, spacing and direction.
    pub fn new(
        shape: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Result<Self> {
        if shape.iter().any(|&n| n == 0) {
            return Err(ImageError::EmptyShape { shape });
        }
        if !spacing.is_valid_spacing() {
            return Err(ImageError::InvalidSpacing {
                spacing: spacing.to_array(),
            });
        }
        if !direction.is_orthogonal() {
            return Err(ImageError::NonOrthogonalDirection);
        }
        Ok(Self {
            shape,
            origin,
            spacing,
            direction,
        })
    }

    /// Geometry with zero origin and identity direction.
    pub fn with_spacing(shape: [usize; 3], spacing: Spacing3) -> Result<Self> {
        Self::new(shape, Point3::origin(), spacing, Direction3::identity())
    }

    pub(crate) fn new_unchecked(
        shape: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Self {
        Self {
            shape,
            origin,
            spacing,
            direction,
        }
    }

    /// Tensor shape `[nz, ny, nx]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Grid size in physical axis order `[nx, ny, nz]`.
    pub fn size_xyz(&self) -> [usize; 3] {
        [self.shape[2], self.shape[1], self.shape[0]]
    }

    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing3 {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction3 {
        &self.direction
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.shape.iter().product()
    }

    /// Volume of one voxel in mm³.
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.product()
    }

    /// Map a continuous `(x, y, z)` index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn index_to_physical(&self, index: [f64; 3]) -> Point3 {
        let scaled = Vector3::new([
            index[0] * self.spacing[0],
            index[1] * self.spacing[1],
            index[2] * self.spacing[2],
        ]);
        self.origin + self.direction * scaled
    }

    /// Map a physical point to a continuous `(x, y, z)` index.
    ///
    /// The direction is orthonormal, so its inverse is its transpose.
    pub fn physical_to_index(&self, point: &Point3) -> [f64; 3] {
        let rotated = self.direction.0.transpose() * (*point - self.origin).0;
        [
            rotated[0] / self.spacing[0],
            rotated[1] / self.spacing[1],
            rotated[2] / self.spacing[2],
        ]
    }

    /// Physical position of the grid's geometric center.
    pub fn physical_center(&self) -> Point3 {
        let [nx, ny, nz] = self.size_xyz();
        self.index_to_physical([
            (nx as f64 - 1.0) / 2.0,
            (ny as f64 - 1.0) / 2.0,
            (nz as f64 - 1.0) / 2.0,
        ])
    }

    /// Half the physical diagonal of the grid, in mm.
    pub fn half_diagonal(&self) -> f64 {
        let [nx, ny, nz] = self.size_xyz();
        let extent = Vector3::new([
            (nx as f64 - 1.0) * self.spacing[0],
            (ny as f64 - 1.0) * self.spacing[1],
            (nz as f64 - 1.0) * self.spacing[2],
        ]);
        extent.norm() / 2.0
    }

    /// Whether `other` describes the same grid, comparing the physical
    /// fields within `tolerance`.
    pub fn matches(&self, other: &Self, tolerance: f64) -> bool {
        self.mismatch(other, tolerance).is_none()
    }

    /// Describe the first difference from `other`, if any.
    pub fn mismatch(&self, other: &Self, tolerance: f64) -> Option<String> {
        if self.shape != other.shape {
            return Some(format!("shape {:?} vs {:?}", self.shape, other.shape));
        }
        let close = |a: &[f64; 3], b: &[f64; 3]| {
            a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
        };
        if !close(&self.spacing.to_array(), &other.spacing.to_array()) {
            return Some(format!(
                "spacing {:?} vs {:?}",
                self.spacing.to_array(),
                other.spacing.to_array()
            ));
        }
        if !close(&self.origin.to_array(), &other.origin.to_array()) {
            return Some(format!(
                "origin {:?} vs {:?}",
                self.origin.to_array(),
                other.origin.to_array()
            ));
        }
        if !self.direction.approx_eq(&other.direction, tolerance) {
            return Some("direction cosines differ".to_string());
        }
        None
    }
}

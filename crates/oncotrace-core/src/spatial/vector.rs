//! Vector type for displacements, translations and voxel spacing.

use nalgebra::Vector3 as NaVector3;
use serde::{Deserialize, Serialize};

/// A displacement in physical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3(pub NaVector3<f64>);

/// Physical distance between adjacent voxels along `(x, y, z)`.
///
/// Alias of [`Vector3`] for semantic clarity.
pub type Spacing3 = Vector3;

impl Vector3 {
    /// Create a new vector from components.
    pub fn new(components: [f64; 3]) -> Self {
        Self(NaVector3::new(components[0], components[1], components[2]))
    }

    /// The zero vector.
    pub fn zeros() -> Self {
        Self(NaVector3::zeros())
    }

    /// Same value on every axis.
    pub fn uniform(value: f64) -> Self {
        Self::new([value; 3])
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// Dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.0.dot(&other.0)
    }

    /// Product of the components. For spacing this is the voxel volume.
    pub fn product(&self) -> f64 {
        self.0.x * self.0.y * self.0.z
    }

    /// True when every component is finite and strictly positive,
    /// the requirement for a voxel spacing.
    pub fn is_valid_spacing(&self) -> bool {
        self.0.iter().all(|s| s.is_finite() && *s > 0.0)
    }

    /// Smallest component.
    pub fn min_component(&self) -> f64 {
        self.0.min()
    }
}

impl std::ops::Index<usize> for Vector3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Vector3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl std::ops::Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self(self.0 / scalar)
    }
}

impl std::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

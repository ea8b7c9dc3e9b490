//! Direction type for representing image orientation.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::Vector3;

/// Direction cosine matrix of a volume.
///
/// Column `i` is the physical direction of image axis `i` (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction3(pub Matrix3<f64>);

impl Direction3 {
    /// Identity orientation.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Check if the matrix is orthogonal (`D * D^T = I`) within `1e-6`.
    pub fn is_orthogonal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        (product - Matrix3::identity()).abs().max() < 1e-6
    }

    /// Check if the matrix is a proper rotation (orthogonal, det = 1).
    pub fn is_proper_rotation(&self) -> bool {
        self.is_orthogonal() && (self.determinant() - 1.0).abs() < 1e-6
    }

    /// Determinant.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Inverse, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Element-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.0 - other.0).abs().max() <= tolerance
    }
}

impl std::ops::Index<(usize, usize)> for Direction3 {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::Mul<Vector3> for Direction3 {
    type Output = Vector3;

    fn mul(self, vector: Vector3) -> Self::Output {
        Vector3(self.0 * vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_identity() {
        let d = Direction3::identity();
        assert!(d.is_orthogonal());
        assert!(d.is_proper_rotation());
        assert_eq!(d * Vector3::new([1.0, 2.0, 3.0]), Vector3::new([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_direction_rotation_about_z() {
        let rot = Direction3(Matrix3::new(
            0.0, -1.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        ));
        assert!(rot.is_proper_rotation());
        let inv = rot.try_inverse().unwrap();
        assert!(inv.approx_eq(&Direction3(rot.0.transpose()), 1e-12));
    }

    #[test]
    fn test_reflection_is_not_proper_rotation() {
        let mut m = Matrix3::identity();
        m[(0, 0)] = -1.0;
        let reflection = Direction3(m);
        assert!(reflection.is_orthogonal());
        assert!(!reflection.is_proper_rotation());
    }
}

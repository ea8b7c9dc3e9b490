//! Point type for representing physical coordinates.

use nalgebra::Point3 as NaPoint3;
use serde::{Deserialize, Serialize};

use super::Vector3;

/// A position in physical (patient) space, in millimetres.
///
/// Component order is `(x, y, z)`, matching spacing and direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3(pub NaPoint3<f64>);

impl Point3 {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; 3]) -> Self {
        Self(NaPoint3::new(coords[0], coords[1], coords[2]))
    }

    /// The physical origin `(0, 0, 0)`.
    pub fn origin() -> Self {
        Self(NaPoint3::origin())
    }

    /// Coordinates as an array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    /// Coordinates as `f32`, the precision used by tensors.
    pub fn to_f32_array(&self) -> [f32; 3] {
        [self.0.x as f32, self.0.y as f32, self.0.z as f32]
    }

    /// Position vector from the physical origin.
    pub fn coords(&self) -> Vector3 {
        Vector3(self.0.coords)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.0 - other.0).norm()
    }
}

impl std::ops::Index<usize> for Point3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl std::ops::IndexMut<usize> for Point3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl std::ops::Sub for Point3 {
    type Output = Vector3;

    fn sub(self, other: Self) -> Self::Output {
        Vector3(self.0 - other.0)
    }
}

impl std::ops::Add<Vector3> for Point3 {
    type Output = Self;

    fn add(self, vector: Vector3) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

impl std::ops::Sub<Vector3> for Point3 {
    type Output = Self;

    fn sub(self, vector: Vector3) -> Self::Output {
        Self(self.0 - vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
        assert_eq!(p[2], 3.0);
        assert_eq!(p.to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_point_subtraction() {
        let p1 = Point3::new([5.0, 5.0, 5.0]);
        let p2 = Point3::new([2.0, 3.0, 4.0]);
        assert_eq!(p1 - p2, Vector3::new([3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        let v = Vector3::new([4.0, 5.0, 6.0]);
        assert_eq!(p + v, Point3::new([5.0, 7.0, 9.0]));
        assert_eq!((p + v) - v, p);
    }

    #[test]
    fn test_point_distance() {
        let a = Point3::origin();
        let b = Point3::new([3.0, 4.0, 0.0]);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }
}

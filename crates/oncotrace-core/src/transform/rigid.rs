//! Rigid transform value type.
//!
//! A rotation about a fixed center followed by a translation:
//! `T(x) = R(x - c) + c + t`. Registration returns this type; it maps points
//! of the fixed volume into the moving volume.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector6};
use serde::{Deserialize, Serialize};

use crate::spatial::{Point3, Vector3};

/// Host-side rigid transform with a unit quaternion rotation.
///
/// The rotation is stored as a [`UnitQuaternion`], so the rotation matrix is
/// orthonormal by construction.
///
/// The six optimizer parameters are the versor vector part `(vx, vy, vz)`
/// followed by the translation `(tx, ty, tz)`. The scalar part is implied,
/// `w = sqrt(1 - |v|²) >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    rotation: UnitQuaternion<f64>,
    translation: Vector3,
    center: Point3,
}

impl RigidTransform {
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3, center: Point3) -> Self {
        Self {
            rotation,
            translation,
            center,
        }
    }

    /// No rotation and no translation, rotating about `center`.
    pub fn identity(center: Point3) -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros(), center)
    }

    /// Pure translation.
    pub fn from_translation(translation: Vector3, center: Point3) -> Self {
        Self::new(UnitQuaternion::identity(), translation, center)
    }

    /// Build from the six optimizer parameters.
    ///
    /// A versor part longer than 1 is projected back onto the unit sphere
    /// (a half-turn rotation).
    pub fn from_parameters(parameters: &Vector6<f64>, center: Point3) -> Self {
        let mut v = nalgebra::Vector3::new(parameters[0], parameters[1], parameters[2]);
        let norm_sq = v.norm_squared();
        if norm_sq > 1.0 {
            v /= norm_sq.sqrt();
        }
        let w = (1.0 - v.norm_squared()).max(0.0).sqrt();
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, v.x, v.y, v.z));
        let translation = Vector3::new([parameters[3], parameters[4], parameters[5]]);
        Self::new(rotation, translation, center)
    }

    /// The six optimizer parameters.
    ///
    /// `q` and `-q` are the same rotation; the representative with `w >= 0`
    /// is chosen.
    pub fn parameters(&self) -> Vector6<f64> {
        let q = self.rotation.quaternion();
        let sign = if q.w < 0.0 { -1.0 } else { 1.0 };
        Vector6::new(
            sign * q.i,
            sign * q.j,
            sign * q.k,
            self.translation[0],
            self.translation[1],
            self.translation[2],
        )
    }

    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Rotation as a 3x3 matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Rotation angle in radians, in `[0, π]`.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Apply to a single physical point.
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        let centered = (*point - self.center).0;
        let rotated = Vector3(self.rotation * centered);
        self.center + rotated + self.translation
    }
}

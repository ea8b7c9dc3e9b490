//! Spatial types for representing points, vectors, spacing, and direction matrices.
//!
//! Every volume handled by oncotrace is three-dimensional, so the types here are
//! fixed to 3-D. They are thin wrappers around nalgebra so the usual linear
//! algebra stays available through `.0`.

pub mod point;
pub mod vector;
pub mod direction;

pub use point::Point3;
pub use vector::{Spacing3, Vector3};
pub use direction::Direction3;

//! Core data model for longitudinal tumor comparison.
//!
//! Provides the volume type ([`Image`] / [`VolumeGrid`]) with its physical
//! geometry, binary masks, rigid transforms in host and tensor form, trilinear
//! interpolation and the smoothing/resampling filters shared by the
//! registration and segmentation crates.

pub mod error;
pub mod cancel;
pub mod spatial;
pub mod image;
pub mod mask;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use cancel::CancellationToken;
pub use error::{ImageError, Result};
pub use image::{GridGeometry, Image, VolumeGrid};
pub use mask::BinaryMask;
pub use spatial::{Direction3, Point3, Spacing3, Vector3};
pub use transform::{RigidTransform, Transform, VersorRigid3DTransform};

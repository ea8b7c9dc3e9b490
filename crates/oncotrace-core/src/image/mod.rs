//! Image types and operations.
//!
//! This module provides the volume type together with its physical
//! geometry and index grid helpers.

pub mod image;
pub mod geometry;
pub mod grid;

pub use image::{Image, VolumeGrid};
pub use geometry::GridGeometry;
pub use grid::{generate_grid_3d, generate_strided_grid_3d};

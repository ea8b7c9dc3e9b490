//! Error types for volume construction.

use thiserror::Error;

/// Errors raised when a volume or mask violates its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Spacing must be finite and strictly positive on every axis.
    #[error("invalid spacing {spacing:?}: every component must be finite and greater than zero")]
    InvalidSpacing { spacing: [f64; 3] },

    /// Number of values does not match the declared shape.
    #[error("data length {actual} does not match shape {shape:?} ({expected} voxels)")]
    DataLengthMismatch {
        shape: [usize; 3],
        expected: usize,
        actual: usize,
    },

    /// At least one axis has zero length.
    #[error("shape {shape:?} has an axis of length zero")]
    EmptyShape { shape: [usize; 3] },

    /// Direction cosines must form an orthonormal matrix.
    #[error("direction matrix is not orthonormal")]
    NonOrthogonalDirection,
}

/// Result type for volume construction.
pub type Result<T> = std::result::Result<T, ImageError>;

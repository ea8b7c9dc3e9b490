//! Error types for change analysis.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The two masks do not share a voxel grid.
    #[error("Mask geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("Voxel volume must be finite and positive, got {0}")]
    InvalidVoxelVolume(f64),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }
}

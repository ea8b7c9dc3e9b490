//! Error types for segmentation.

use oncotrace_core::ImageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// No voxel has a strictly positive intensity, so no threshold exists.
    #[error("Volume has no positive voxels")]
    EmptyVolume,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Segmentation cancelled")]
    Cancelled,

    #[error(transparent)]
    Image(#[from] ImageError),
}

pub type Result<T> = std::result::Result<T, SegmentationError>;

impl SegmentationError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(SegmentationError::EmptyVolume.to_string(), "Volume has no positive voxels");
        assert_eq!(
            SegmentationError::invalid_configuration("percentile 0").to_string(),
            "Invalid configuration: percentile 0"
        );
    }
}

//! Pipeline error type.

use oncotrace_analysis::AnalysisError;
use oncotrace_core::ImageError;
use oncotrace_registration::RegistrationError;
use oncotrace_segmentation::SegmentationError;
use thiserror::Error;

/// Any failure of a pipeline stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Malformed or unreadable configuration document.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// The failure came from a caller's cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Registration(RegistrationError::Cancelled) | Self::Segmentation(SegmentationError::Cancelled)
        )
    }
}

//! Tumor segmentation by percentile threshold.
//!
//! Each stage is a plain function over host voxel buffers in `[nz, ny, nx]`
//! order; [`Segmenter`] chains them and wraps the result in a
//! [`oncotrace_core::BinaryMask`] on the input grid.

pub mod components;
pub mod config;
pub mod error;
pub mod morphology;
pub mod segmenter;
pub mod threshold;

pub use components::{filter_components, label_components, ComponentLabels};
pub use config::{ComponentSelection, SegmentationConfig};
pub use error::{Result, SegmentationError};
pub use morphology::{ball_offsets, binary_opening, dilate, erode};
pub use segmenter::{SegmentationInfo, Segmenter};
pub use threshold::{binarize, percentile_threshold};

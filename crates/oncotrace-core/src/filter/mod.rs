//! Image filters: smoothing, downsampling, pyramids and resampling.

pub mod gaussian;
pub mod downsample;
pub mod pyramid;
pub mod resample;

pub use gaussian::GaussianFilter;
pub use downsample::DownsampleFilter;
pub use pyramid::{MultiResolutionPyramid, PyramidLevel};
pub use resample::{resample_onto, ResampleImageFilter};

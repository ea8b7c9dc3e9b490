use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use super::downsample::DownsampleFilter;
use super::gaussian::GaussianFilter;
use crate::image::Image;

/// One level of a coarse-to-fine schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PyramidLevel {
    /// Integer downsampling factor applied on every axis.
    pub shrink_factor: usize,
    /// Gaussian sigma in mm applied before downsampling.
    pub smoothing_sigma_mm: f64,
}

impl PyramidLevel {
    pub fn new(shrink_factor: usize, smoothing_sigma_mm: f64) -> Self {
        Self {
            shrink_factor,
            smoothing_sigma_mm,
        }
    }

    /// Full resolution, no smoothing.
    pub fn full_resolution() -> Self {
        Self::new(1, 0.0)
    }

    /// Power-of-two schedule with `levels` entries, coarsest first.
    ///
    /// `levels = 3` gives factors `[4, 2, 1]` with sigmas `[2, 1, 0]` mm.
    pub fn power_of_two_schedule(levels: usize) -> Vec<Self> {
        (0..levels)
            .map(|i| {
                let factor = 2usize.pow((levels - 1 - i) as u32);
                let sigma = if factor > 1 { 0.5 * factor as f64 } else { 0.0 };
                Self::new(factor, sigma)
            })
            .collect()
    }

    fn is_identity(&self) -> bool {
        self.shrink_factor <= 1 && self.smoothing_sigma_mm <= 1e-6
    }
}

/// Multi-resolution image pyramid.
///
/// Holds one smoothed, downsampled copy of the input per schedule level,
/// ordered like the schedule (coarsest first).
pub struct MultiResolutionPyramid<B: Backend> {
    images: Vec<Image<B>>,
}

impl<B: Backend> MultiResolutionPyramid<B> {
    /// Build the pyramid for `input` following `schedule`.
    pub fn new(input: &Image<B>, schedule: &[PyramidLevel]) -> Self {
        let images = schedule
            .iter()
            .map(|level| {
                if level.is_identity() {
                    return input.clone();
                }
                let smoothed = if level.smoothing_sigma_mm > 1e-6 {
                    GaussianFilter::isotropic(level.smoothing_sigma_mm).apply(input)
                } else {
                    input.clone()
                };
                if level.shrink_factor > 1 {
                    DownsampleFilter::uniform(level.shrink_factor).apply(&smoothed)
                } else {
                    smoothed
                }
            })
            .collect();
        Self { images }
    }

    /// Image at `level`, if it exists.
    pub fn get_level(&self, level: usize) -> Option<&Image<B>> {
        self.images.get(level)
    }

    /// Number of levels.
    pub fn levels(&self) -> usize {
        self.images.len()
    }
}

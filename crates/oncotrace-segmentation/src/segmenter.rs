//! Threshold, component and opening pipeline producing a tumor mask.

use burn::tensor::backend::Backend;
use oncotrace_core::{BinaryMask, CancellationToken, Image};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::components::{count_kept, filter_components, label_components};
use crate::config::SegmentationConfig;
use crate::error::{Result, SegmentationError};
use crate::morphology::binary_opening;
use crate::threshold::{binarize, percentile_threshold};

/// Per-stage statistics of one segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationInfo {
    /// Intensity threshold derived from the percentile.
    pub threshold: f64,
    /// Voxels with strictly positive intensity.
    pub positive_voxels: usize,
    /// Voxels at or above the threshold.
    pub foreground_voxels: usize,
    /// Components found after thresholding.
    pub components_found: usize,
    /// Components left in the final mask.
    pub components_retained: usize,
    /// Foreground voxels in the final mask.
    pub final_voxels: usize,
    /// No component survived; the mask is all background.
    pub no_region_found: bool,
}

/// Segments the brightest region of a volume.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
    cancel: Option<CancellationToken>,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, cancel: None })
    }

    /// Check `token` between stages.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Segment `volume`, returning a mask on the same grid.
    pub fn segment<B: Backend>(&self, volume: &Image<B>) -> Result<(BinaryMask<B>, SegmentationInfo)> {
        let shape = volume.shape();
        let values = volume.to_vec();
        let min_size = self.config.min_component_size;
        let selection = self.config.selection;

        self.check_cancelled()?;
        let positive_voxels = values.iter().filter(|v| **v > 0.0).count();
        let threshold = percentile_threshold(&values, self.config.percentile)
            .ok_or(SegmentationError::EmptyVolume)?;
        debug!(threshold, positive_voxels, percentile = self.config.percentile, "Threshold");

        self.check_cancelled()?;
        let foreground = binarize(&values, threshold);
        let foreground_voxels = count(&foreground);

        self.check_cancelled()?;
        let components = label_components(&foreground, shape);
        let filtered = filter_components(&components, min_size, selection);
        debug!(
            found = components.num_components(),
            kept = count_kept(&components, min_size, selection),
            "Connected components"
        );

        self.check_cancelled()?;
        let opened = binary_opening(&filtered, shape, self.config.opening_radius);

        self.check_cancelled()?;
        let relabeled = label_components(&opened, shape);
        let final_mask = filter_components(&relabeled, min_size, selection);
        let components_retained = count_kept(&relabeled, min_size, selection);
        let final_voxels = count(&final_mask);

        let info = SegmentationInfo {
            threshold,
            positive_voxels,
            foreground_voxels,
            components_found: components.num_components(),
            components_retained,
            final_voxels,
            no_region_found: components_retained == 0,
        };

        if info.no_region_found {
            warn!(threshold, foreground_voxels, "No region survived segmentation");
        } else {
            info!(
                threshold,
                components = components_retained,
                voxels = final_voxels,
                "Segmentation complete"
            );
        }

        let mask = BinaryMask::from_vec(final_mask, *volume.geometry(), &volume.data().device())?;
        Ok((mask, info))
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SegmentationError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn count(mask: &[bool]) -> usize {
    mask.iter().filter(|v| **v).count()
}

//! Segmentation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};

/// Which connected components survive the size filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComponentSelection {
    /// Every component with at least the minimum voxel count.
    #[default]
    AllAboveMinimum,
    /// Only the largest component, provided it reaches the minimum.
    LargestOnly,
}

/// Parameters of the threshold, component and opening stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Percentile of the positive intensities used as threshold, in (0, 100].
    pub percentile: f64,
    /// Components with fewer voxels are discarded.
    pub min_component_size: usize,
    /// Radius of the spherical opening element, in voxels. 0 disables it.
    pub opening_radius: usize,
    pub selection: ComponentSelection,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            percentile: 98.5,
            min_component_size: 100,
            opening_radius: 2,
            selection: ComponentSelection::AllAboveMinimum,
        }
    }
}

/// Largest accepted opening radius; the ball has about `4/3 π r³` offsets.
const MAX_OPENING_RADIUS: usize = 32;

impl SegmentationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn with_min_component_size(mut self, min_component_size: usize) -> Self {
        self.min_component_size = min_component_size;
        self
    }

    pub fn with_opening_radius(mut self, opening_radius: usize) -> Self {
        self.opening_radius = opening_radius;
        self
    }

    pub fn with_selection(mut self, selection: ComponentSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.percentile > 0.0 && self.percentile <= 100.0) {
            return Err(SegmentationError::invalid_configuration(format!(
                "Percentile must be in (0, 100], got {}",
                self.percentile
            )));
        }
        if self.opening_radius > MAX_OPENING_RADIUS {
            return Err(SegmentationError::invalid_configuration(format!(
                "Opening radius {} exceeds {}",
                self.opening_radius, MAX_OPENING_RADIUS
            )));
        }
        Ok(())
    }
}

//! Volume and overlap comparison of two co-registered masks.

use burn::tensor::backend::Backend;
use oncotrace_core::BinaryMask;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::change_map::{ChangeCounts, ChangeMap};
use crate::error::{AnalysisError, Result};
use crate::overlap::OverlapCounts;

/// Physical tolerance for treating two grids as identical.
pub const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// Share of the union occupied by each change class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeFractions {
    pub regression: f64,
    pub progression: f64,
    pub stable: f64,
}

impl ChangeFractions {
    /// Fractions of `counts.union()`; all zero when the union is empty.
    pub fn from_counts(counts: &ChangeCounts) -> Self {
        let union = counts.union();
        if union == 0 {
            return Self::default();
        }
        let union = union as f64;
        Self {
            regression: counts.regression as f64 / union,
            progression: counts.progression as f64 / union,
            stable: counts.stable as f64 / union,
        }
    }
}

/// Quantitative comparison of a baseline and a follow-up mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Baseline volume in mm³.
    pub volume1_mm3: f64,
    /// Follow-up volume in mm³.
    pub volume2_mm3: f64,
    pub dice: f64,
    pub jaccard: f64,
    /// `volume2 - volume1` in mm³.
    pub absolute_change_mm3: f64,
    /// Absolute change relative to the baseline; `None` for an empty baseline.
    pub relative_change: Option<f64>,
    /// `relative_change` in percent.
    pub relative_change_percent: Option<f64>,
    pub fractions: ChangeFractions,
    pub counts: ChangeCounts,
    pub voxel_volume_mm3: f64,
}

/// Compares two masks defined on the same grid.
#[derive(Debug, Clone, Copy)]
pub struct ChangeAnalyzer {
    tolerance: f64,
}

impl Default for ChangeAnalyzer {
    fn default() -> Self {
        Self {
            tolerance: GEOMETRY_TOLERANCE,
        }
    }
}

impl ChangeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `mask1` (baseline) with `mask2` (follow-up) using an explicit
    /// voxel volume in mm³.
    pub fn analyze<B: Backend>(
        &self,
        mask1: &BinaryMask<B>,
        mask2: &BinaryMask<B>,
        voxel_volume: f64,
    ) -> Result<AnalysisResult> {
        check_voxel_volume(voxel_volume)?;
        let map = self.change_map(mask1, mask2)?;
        self.summarize_map(&map, voxel_volume)
    }

    /// Like [`ChangeAnalyzer::analyze`], taking the voxel volume from `mask1`'s spacing.
    pub fn analyze_masks<B: Backend>(
        &self,
        mask1: &BinaryMask<B>,
        mask2: &BinaryMask<B>,
    ) -> Result<AnalysisResult> {
        self.analyze(mask1, mask2, mask1.geometry().voxel_volume())
    }

    /// Analysis and change map from a single classification of the masks.
    pub fn analyze_with_map<B: Backend>(
        &self,
        mask1: &BinaryMask<B>,
        mask2: &BinaryMask<B>,
    ) -> Result<(AnalysisResult, ChangeMap<B>)> {
        let voxel_volume = mask1.geometry().voxel_volume();
        check_voxel_volume(voxel_volume)?;
        let map = self.change_map(mask1, mask2)?;
        let result = self.summarize_map(&map, voxel_volume)?;
        Ok((result, map))
    }

    /// Metrics of an existing change map.
    pub fn summarize_map<B: Backend>(
        &self,
        map: &ChangeMap<B>,
        voxel_volume: f64,
    ) -> Result<AnalysisResult> {
        check_voxel_volume(voxel_volume)?;
        let result = summarize(&map.counts(), voxel_volume);

        info!(
            volume1_mm3 = result.volume1_mm3,
            volume2_mm3 = result.volume2_mm3,
            dice = result.dice,
            jaccard = result.jaccard,
            "Change analysis"
        );
        Ok(result)
    }

    /// Voxel-wise change classification of the two masks.
    pub fn change_map<B: Backend>(
        &self,
        mask1: &BinaryMask<B>,
        mask2: &BinaryMask<B>,
    ) -> Result<ChangeMap<B>> {
        if let Some(reason) = mask1.geometry().mismatch(mask2.geometry(), self.tolerance) {
            return Err(AnalysisError::geometry_mismatch(reason));
        }
        Ok(ChangeMap::from_masks(mask1, mask2))
    }
}

fn check_voxel_volume(voxel_volume: f64) -> Result<()> {
    if !voxel_volume.is_finite() || voxel_volume <= 0.0 {
        return Err(AnalysisError::InvalidVoxelVolume(voxel_volume));
    }
    Ok(())
}

fn summarize(counts: &ChangeCounts, voxel_volume: f64) -> AnalysisResult {
    let overlap = OverlapCounts::new(counts.first(), counts.second(), counts.stable);
    let volume1 = overlap.first as f64 * voxel_volume;
    let volume2 = overlap.second as f64 * voxel_volume;
    let absolute = volume2 - volume1;
    let relative = (overlap.first > 0).then(|| absolute / volume1);

    AnalysisResult {
        volume1_mm3: volume1,
        volume2_mm3: volume2,
        dice: overlap.dice(),
        jaccard: overlap.jaccard(),
        absolute_change_mm3: absolute,
        relative_change: relative,
        relative_change_percent: relative.map(|r| r * 100.0),
        fractions: ChangeFractions::from_counts(counts),
        counts: *counts,
        voxel_volume_mm3: voxel_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_growth() {
        let counts = ChangeCounts {
            background: 900,
            regression: 0,
            progression: 40,
            stable: 60,
        };
        let result = summarize(&counts, 2.0);
        assert_eq!(result.volume1_mm3, 120.0);
        assert_eq!(result.volume2_mm3, 200.0);
        assert_eq!(result.absolute_change_mm3, 80.0);
        assert!((result.relative_change.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((result.relative_change_percent.unwrap() - 66.666_666).abs() < 1e-3);
        assert!((result.fractions.progression - 0.4).abs() < 1e-12);
        assert!((result.fractions.stable - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_baseline_has_no_relative_change() {
        let counts = ChangeCounts {
            background: 10,
            regression: 0,
            progression: 5,
            stable: 0,
        };
        let result = summarize(&counts, 1.0);
        assert_eq!(result.relative_change, None);
        assert_eq!(result.relative_change_percent, None);
        assert_eq!(result.fractions.progression, 1.0);
    }

    #[test]
    fn test_empty_union() {
        let counts = ChangeCounts {
            background: 10,
            ..ChangeCounts::default()
        };
        let result = summarize(&counts, 1.0);
        assert_eq!(result.fractions, ChangeFractions::default());
        assert_eq!(result.dice, 0.0);
    }
}

//! Results of a pipeline run.

use burn::tensor::backend::Backend;
use oncotrace_analysis::{AnalysisResult, ChangeMap};
use oncotrace_core::{BinaryMask, Image, RigidTransform};
use oncotrace_registration::ConvergenceInfo;
use oncotrace_segmentation::SegmentationInfo;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Final verdict of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineOutcome {
    /// Both time points produced a region and were compared.
    Analyzed(AnalysisResult),
    /// At least one time point produced no region, so nothing was compared.
    NoComparableRegion {
        baseline_found: bool,
        followup_found: bool,
    },
}

impl PipelineOutcome {
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Analyzed(result) => Some(result),
            Self::NoComparableRegion { .. } => None,
        }
    }
}

/// Everything a pipeline run produced, including the voxel data a renderer
/// needs.
#[derive(Debug, Clone)]
pub struct PipelineReport<B: Backend> {
    /// Baseline-to-follow-up physical transform.
    pub transform: RigidTransform,
    pub convergence: ConvergenceInfo,
    /// Intensity correlation of the baseline and the registered follow-up.
    pub alignment_quality: f64,
    /// Follow-up resampled onto the baseline grid.
    pub registered_followup: Image<B>,
    pub baseline_mask: BinaryMask<B>,
    pub followup_mask: BinaryMask<B>,
    pub baseline_segmentation: SegmentationInfo,
    pub followup_segmentation: SegmentationInfo,
    /// Present when both masks hold a region.
    pub change_map: Option<ChangeMap<B>>,
    pub outcome: PipelineOutcome,
}

impl<B: Backend> PipelineReport<B> {
    /// Serializable part of the report.
    pub fn summary(&self) -> PipelineSummary {
        let parameters = self.transform.parameters();
        PipelineSummary {
            rotation_angle_deg: self.transform.rotation_angle().to_degrees(),
            translation_mm: self.transform.translation().to_array(),
            transform_parameters: std::array::from_fn(|i| parameters[i]),
            convergence: self.convergence.clone(),
            alignment_quality: self.alignment_quality,
            baseline_segmentation: self.baseline_segmentation.clone(),
            followup_segmentation: self.followup_segmentation.clone(),
            outcome: self.outcome.clone(),
        }
    }
}

/// Plain-data digest of a [`PipelineReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub rotation_angle_deg: f64,
    pub translation_mm: [f64; 3],
    /// Versor and translation parameters `(vx, vy, vz, tx, ty, tz)`.
    pub transform_parameters: [f64; 6],
    pub convergence: ConvergenceInfo,
    pub alignment_quality: f64,
    pub baseline_segmentation: SegmentationInfo,
    pub followup_segmentation: SegmentationInfo,
    pub outcome: PipelineOutcome,
}

impl PipelineSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

//! Registration, segmentation and change analysis of two time points.

use std::sync::Arc;
use std::time::Instant;

use burn::tensor::backend::AutodiffBackend;
use oncotrace_analysis::ChangeAnalyzer;
use oncotrace_core::filter::resample_onto;
use oncotrace_core::{BinaryMask, CancellationToken, Image};
use oncotrace_registration::{resampled_correlation, ProgressCallback, Registrar};
use oncotrace_segmentation::{SegmentationInfo, Segmenter};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::report::{PipelineOutcome, PipelineReport};

/// Compares a baseline scan with a follow-up scan.
///
/// The follow-up is rigidly registered onto the baseline and resampled onto
/// its grid, both volumes are segmented, and the masks are compared.
#[derive(Debug, Clone)]
pub struct LongitudinalPipeline {
    config: PipelineConfig,
    registrar: Registrar,
    segmenter: Segmenter,
    analyzer: ChangeAnalyzer,
}

type Segmented<B> = (BinaryMask<B>, SegmentationInfo);

impl LongitudinalPipeline {
    /// Build the pipeline, validating every stage's configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let registrar = Registrar::new(config.registration.clone())?;
        let segmenter = Segmenter::new(config.segmentation.clone())?;
        Ok(Self {
            config,
            registrar,
            segmenter,
            analyzer: ChangeAnalyzer::new(),
        })
    }

    /// Share `token` with every stage.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.registrar = self.registrar.with_cancellation(token.clone());
        self.segmenter = self.segmenter.with_cancellation(token);
        self
    }

    /// Receive registration progress.
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.registrar = self.registrar.with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `baseline` and `followup`.
    pub fn run<B: AutodiffBackend>(
        &self,
        baseline: &Image<B>,
        followup: &Image<B>,
    ) -> Result<PipelineReport<B>> {
        let started = Instant::now();

        let (transform, convergence) = self.registrar.align(baseline, followup)?;
        let registered = resample_onto(followup, baseline.geometry(), &transform);
        let quality = resampled_correlation(baseline, &registered);
        info!(
            iterations = convergence.iterations,
            converged = convergence.converged,
            quality,
            elapsed_s = started.elapsed().as_secs_f64(),
            "Registration stage done"
        );

        let (baseline_segmented, followup_segmented) = self.segment_both(baseline, &registered)?;
        let (baseline_mask, baseline_info) = baseline_segmented;
        let (followup_mask, followup_info) = followup_segmented;

        let (change_map, outcome) = if baseline_info.no_region_found || followup_info.no_region_found {
            warn!(
                baseline_found = !baseline_info.no_region_found,
                followup_found = !followup_info.no_region_found,
                "No comparable region, skipping change analysis"
            );
            (
                None,
                PipelineOutcome::NoComparableRegion {
                    baseline_found: !baseline_info.no_region_found,
                    followup_found: !followup_info.no_region_found,
                },
            )
        } else {
            let (result, map) = self.analyzer.analyze_with_map(&baseline_mask, &followup_mask)?;
            (Some(map), PipelineOutcome::Analyzed(result))
        };

        info!(elapsed_s = started.elapsed().as_secs_f64(), "Pipeline finished");

        Ok(PipelineReport {
            transform,
            convergence,
            alignment_quality: quality,
            registered_followup: registered,
            baseline_mask,
            followup_mask,
            baseline_segmentation: baseline_info,
            followup_segmentation: followup_info,
            change_map,
            outcome,
        })
    }

    fn segment_both<B: AutodiffBackend>(
        &self,
        baseline: &Image<B>,
        registered: &Image<B>,
    ) -> Result<(Segmented<B>, Segmented<B>)> {
        if self.config.parallel_segmentation {
            let (first, second) = rayon::join(
                || self.segmenter.segment(baseline),
                || self.segmenter.segment(registered),
            );
            Ok((first?, second?))
        } else {
            let first = self.segmenter.segment(baseline)?;
            let second = self.segmenter.segment(registered)?;
            Ok((first, second))
        }
    }
}

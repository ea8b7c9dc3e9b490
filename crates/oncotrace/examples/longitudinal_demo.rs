//! Longitudinal Change Example
//!
//! Builds a synthetic baseline scan and a follow-up in which the head has
//! moved and the lesion has brightened and grown, then runs the full
//! pipeline and prints the JSON summary.
//!
//! Usage:
//!   cargo run -p oncotrace --example longitudinal_demo [config.json]

use std::sync::Arc;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use oncotrace::oncotrace_core::spatial::{Direction3, Point3, Spacing3};
use oncotrace::oncotrace_core::Image;
use oncotrace::oncotrace_registration::{RegistrationConfig, TracingProgressCallback};
use oncotrace::oncotrace_segmentation::SegmentationConfig;
use oncotrace::{LongitudinalPipeline, PipelineConfig, PipelineOutcome};

type Backend = Autodiff<NdArray<f32>>;

const SIZE: usize = 40;

fn synthetic_scan(
    shift: [f64; 3],
    lesion_radius: f64,
    lesion_amplitude: f64,
    device: &<Backend as burn::tensor::backend::Backend>::Device,
) -> anyhow::Result<Image<Backend>> {
    let center = (SIZE as f64 - 1.0) / 2.0;
    let lesion = [center + 5.0, center - 3.0, center];
    let mut data = Vec::with_capacity(SIZE * SIZE * SIZE);
    for z in 0..SIZE {
        for y in 0..SIZE {
            for x in 0..SIZE {
                let p = [x as f64 - shift[0], y as f64 - shift[1], z as f64 - shift[2]];
                let r2 = (0..3).map(|i| (p[i] - center).powi(2)).sum::<f64>();
                if r2 > 16.0 * 16.0 {
                    data.push(0.0);
                    continue;
                }
                let l2 = (0..3).map(|i| (p[i] - lesion[i]).powi(2)).sum::<f64>();
                let tissue = 15.0 + 40.0 * (-r2 / 120.0).exp();
                let tumor = lesion_amplitude * (-l2 / (2.0 * lesion_radius * lesion_radius)).exp();
                data.push((tissue + tumor) as f32);
            }
        }
    }
    Ok(Image::from_vec(
        data,
        [SIZE, SIZE, SIZE],
        Point3::origin(),
        Spacing3::new([0.9, 0.9, 1.2]),
        Direction3::identity(),
        device,
    )?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::default()
            .with_registration(
                RegistrationConfig::default()
                    .with_histogram_bins(32)
                    .with_max_iterations(100),
            )
            .with_segmentation(SegmentationConfig::default().with_min_component_size(30)),
    };

    let device = Default::default();
    let baseline = synthetic_scan([0.0; 3], 2.5, 120.0, &device)?;
    let followup = synthetic_scan([1.5, -1.0, 0.5], 3.2, 150.0, &device)?;
    println!("Baseline shape: {:?}", baseline.shape());
    println!("Follow-up shape: {:?}", followup.shape());

    let pipeline = LongitudinalPipeline::new(config)?
        .with_progress_callback(Arc::new(TracingProgressCallback::default()));
    let report = pipeline.run(&baseline, &followup)?;

    let t = report.transform.translation().to_array();
    println!(
        "Recovered translation: [{:.2}, {:.2}, {:.2}] mm (quality {:.3})",
        t[0], t[1], t[2], report.alignment_quality
    );

    match &report.outcome {
        PipelineOutcome::Analyzed(result) => {
            println!("Baseline volume:  {:.1} mm3", result.volume1_mm3);
            println!("Follow-up volume: {:.1} mm3", result.volume2_mm3);
            println!("Dice: {:.3}  Jaccard: {:.3}", result.dice, result.jaccard);
        }
        PipelineOutcome::NoComparableRegion {
            baseline_found,
            followup_found,
        } => {
            println!(
                "No comparable region (baseline: {}, follow-up: {})",
                baseline_found, followup_found
            );
        }
    }

    println!("{}", report.summary().to_json()?);
    Ok(())
}

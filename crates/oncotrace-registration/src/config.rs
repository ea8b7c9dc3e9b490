//! Registration configuration.

use oncotrace_core::filter::PyramidLevel;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation;

/// How the starting transform is chosen when the caller provides none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformInitialization {
    /// No rotation or translation, rotating about the fixed volume's center.
    #[default]
    Identity,
    /// Translate the moving intensity centroid onto the fixed one.
    Moments,
}

/// Parameters of the rigid registration.
///
/// Per-level settings (learning rate, iteration limit) apply afresh at each
/// level of `schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Initial step length, in scaled parameter units (about 1 mm).
    pub learning_rate: f64,
    /// Stop once the step length falls below this.
    pub min_step_length: f64,
    /// Step length multiplier applied when the gradient reverses.
    pub relaxation_factor: f64,
    /// Iteration limit per resolution level.
    pub max_iterations: usize,
    /// Histogram bins per intensity axis.
    pub histogram_bins: usize,
    /// Stop once the scaled gradient norm falls below this.
    pub gradient_tolerance: f64,
    /// Consecutive non-improving iterations, after a relaxation, treated as divergence.
    pub divergence_patience: usize,
    /// Parzen kernel standard deviation in bins.
    pub parzen_sigma_bins: f64,
    /// Use every n-th fixed voxel along each axis as a metric sample.
    pub sampling_stride: usize,
    /// Random fraction of the strided samples to keep; all of them when `None`.
    pub sampling_percentage: Option<f64>,
    /// Upper bound on metric samples per level. Every sample stays in the
    /// autodiff graph until the backward pass, so this bounds memory.
    pub max_samples: usize,
    /// Seed of the random sample selection.
    pub sampling_seed: u64,
    /// Minimum fraction of samples that must map inside the moving grid.
    pub min_overlap_fraction: f64,
    /// Starting transform strategy for [`crate::Registrar::align`].
    pub initialization: TransformInitialization,
    /// Resolution levels, coarse to fine.
    pub schedule: Vec<PyramidLevel>,
    /// Explicit parameter scales `(vx, vy, vz, tx, ty, tz)`; estimated when `None`.
    pub parameter_scales: Option<[f64; 6]>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            min_step_length: 0.001,
            relaxation_factor: 0.5,
            max_iterations: 200,
            histogram_bins: 50,
            gradient_tolerance: 1e-4,
            divergence_patience: 50,
            parzen_sigma_bins: 1.0,
            sampling_stride: 1,
            sampling_percentage: None,
            max_samples: 100_000,
            sampling_seed: 42,
            min_overlap_fraction: 0.05,
            initialization: TransformInitialization::Identity,
            schedule: PyramidLevel::power_of_two_schedule(3),
            parameter_scales: None,
        }
    }
}

impl RegistrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full resolution only, no pyramid.
    pub fn single_level() -> Self {
        Self {
            schedule: vec![PyramidLevel::full_resolution()],
            ..Self::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_min_step_length(mut self, min_step_length: f64) -> Self {
        self.min_step_length = min_step_length;
        self
    }

    pub fn with_relaxation_factor(mut self, relaxation_factor: f64) -> Self {
        self.relaxation_factor = relaxation_factor;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_histogram_bins(mut self, histogram_bins: usize) -> Self {
        self.histogram_bins = histogram_bins;
        self
    }

    pub fn with_gradient_tolerance(mut self, gradient_tolerance: f64) -> Self {
        self.gradient_tolerance = gradient_tolerance;
        self
    }

    pub fn with_divergence_patience(mut self, divergence_patience: usize) -> Self {
        self.divergence_patience = divergence_patience;
        self
    }

    pub fn with_parzen_sigma_bins(mut self, parzen_sigma_bins: f64) -> Self {
        self.parzen_sigma_bins = parzen_sigma_bins;
        self
    }

    pub fn with_sampling_stride(mut self, sampling_stride: usize) -> Self {
        self.sampling_stride = sampling_stride;
        self
    }

    pub fn with_sampling_percentage(mut self, fraction: f64) -> Self {
        self.sampling_percentage = Some(fraction);
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_sampling_seed(mut self, seed: u64) -> Self {
        self.sampling_seed = seed;
        self
    }

    /// Number of metric samples to draw out of `available` strided voxels.
    pub fn sample_count(&self, available: usize) -> usize {
        let wanted = match self.sampling_percentage {
            Some(fraction) => (available as f64 * fraction).ceil() as usize,
            None => available,
        };
        wanted.min(self.max_samples).min(available).max(1)
    }

    pub fn with_min_overlap_fraction(mut self, min_overlap_fraction: f64) -> Self {
        self.min_overlap_fraction = min_overlap_fraction;
        self
    }

    pub fn with_initialization(mut self, initialization: TransformInitialization) -> Self {
        self.initialization = initialization;
        self
    }

    pub fn with_schedule(mut self, schedule: Vec<PyramidLevel>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_parameter_scales(mut self, scales: [f64; 6]) -> Self {
        self.parameter_scales = Some(scales);
        self
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        validation::validate_learning_rate(self.learning_rate)?;
        validation::validate_min_step_length(self.min_step_length, self.learning_rate)?;
        validation::validate_relaxation_factor(self.relaxation_factor)?;
        validation::validate_iterations(self.max_iterations)?;
        validation::validate_histogram_bins(self.histogram_bins)?;
        validation::validate_positive("gradient tolerance", self.gradient_tolerance)?;
        validation::validate_positive("Parzen sigma", self.parzen_sigma_bins)?;
        validation::validate_sampling_stride(self.sampling_stride)?;
        if let Some(fraction) = self.sampling_percentage {
            validation::validate_positive("sampling percentage", fraction)?;
            validation::validate_fraction("sampling percentage", fraction)?;
        }
        if self.max_samples == 0 {
            return Err(crate::RegistrationError::invalid_configuration(
                "max samples must be at least 1",
            ));
        }
        validation::validate_fraction("minimum overlap fraction", self.min_overlap_fraction)?;
        validation::validate_schedule(&self.schedule)?;
        if let Some(scales) = &self.parameter_scales {
            validation::validate_parameter_scales(scales)?;
        }
        if self.divergence_patience == 0 {
            return Err(crate::RegistrationError::invalid_configuration(
                "divergence patience must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistrationConfig::default();
        assert_eq!(config.learning_rate, 1.0);
        assert_eq!(config.min_step_length, 0.001);
        assert_eq!(config.relaxation_factor, 0.5);
        assert_eq!(config.max_iterations, 200);
        assert_eq!(config.histogram_bins, 50);
        assert_eq!(config.initialization, TransformInitialization::Identity);
        assert_eq!(
            config.schedule.iter().map(|l| l.shrink_factor).collect::<Vec<_>>(),
            vec![4, 2, 1]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_level() {
        let config = RegistrationConfig::single_level();
        assert_eq!(config.schedule, vec![PyramidLevel::full_resolution()]);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RegistrationConfig::new().with_learning_rate(0.0).validate().is_err());
        assert!(RegistrationConfig::new().with_relaxation_factor(1.0).validate().is_err());
        assert!(RegistrationConfig::new().with_histogram_bins(1).validate().is_err());
        assert!(RegistrationConfig::new().with_schedule(vec![]).validate().is_err());
        assert!(RegistrationConfig::new().with_min_overlap_fraction(1.5).validate().is_err());
        assert!(RegistrationConfig::new().with_divergence_patience(0).validate().is_err());
        assert!(RegistrationConfig::new()
            .with_parameter_scales([1.0, 1.0, 0.0, 1.0, 1.0, 1.0])
            .validate()
            .is_err());
    }

    #[test]
    fn test_sample_count_budget() {
        let config = RegistrationConfig::default();
        assert_eq!(config.sample_count(5_000), 5_000);
        assert_eq!(config.sample_count(256 * 256 * 120), 100_000);

        let config = config.with_sampling_percentage(0.25).with_max_samples(1_000);
        assert_eq!(config.sample_count(2_000), 500);
        assert_eq!(config.sample_count(40_000), 1_000);
        assert_eq!(config.sample_count(2), 1);

        assert!(RegistrationConfig::new().with_sampling_percentage(0.0).validate().is_err());
        assert!(RegistrationConfig::new().with_sampling_percentage(1.5).validate().is_err());
        assert!(RegistrationConfig::new().with_max_samples(0).validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_with_partial_input() {
        let config: RegistrationConfig =
            serde_json::from_str(r#"{"max_iterations": 40, "initialization": "Moments"}"#).unwrap();
        assert_eq!(config.max_iterations, 40);
        assert_eq!(config.initialization, TransformInitialization::Moments);
        assert_eq!(config.histogram_bins, 50);

        let text = serde_json::to_string(&config).unwrap();
        let back: RegistrationConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}

//! Validation utilities for registration inputs and configuration.

use burn::tensor::backend::Backend;
use oncotrace_core::filter::PyramidLevel;
use oncotrace_core::Image;

use crate::error::{RegistrationError, Result};

/// Validate learning rate.
pub fn validate_learning_rate(lr: f64) -> Result<()> {
    if !lr.is_finite() || lr <= 0.0 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Learning rate must be positive, got {}",
            lr
        )));
    }
    if lr > 100.0 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Learning rate too large: {}",
            lr
        )));
    }
    Ok(())
}

/// Validate the minimum step length against the initial learning rate.
pub fn validate_min_step_length(min_step: f64, lr: f64) -> Result<()> {
    if !min_step.is_finite() || min_step <= 0.0 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Minimum step length must be positive, got {}",
            min_step
        )));
    }
    if min_step >= lr {
        return Err(RegistrationError::invalid_configuration(format!(
            "Minimum step length ({}) must be below the learning rate ({})",
            min_step, lr
        )));
    }
    Ok(())
}

/// Validate the relaxation factor, which must lie strictly between 0 and 1.
pub fn validate_relaxation_factor(factor: f64) -> Result<()> {
    if !(factor > 0.0 && factor < 1.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Relaxation factor must be in (0, 1), got {}",
            factor
        )));
    }
    Ok(())
}

/// Validate iteration count.
pub fn validate_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(RegistrationError::invalid_configuration("Iterations must be positive"));
    }
    if iterations > 1_000_000 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Iterations too large: {}",
            iterations
        )));
    }
    Ok(())
}

/// Validate the histogram bin count.
pub fn validate_histogram_bins(num_bins: usize) -> Result<()> {
    if num_bins < 2 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Number of bins must be at least 2, got {}",
            num_bins
        )));
    }
    if num_bins > 1024 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Number of bins too large: {}",
            num_bins
        )));
    }
    Ok(())
}

/// Validate a strictly positive finite value.
pub fn validate_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RegistrationError::invalid_configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a fraction in `[0, 1]`.
pub fn validate_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RegistrationError::invalid_configuration(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate the sampling stride.
pub fn validate_sampling_stride(stride: usize) -> Result<()> {
    if stride == 0 {
        return Err(RegistrationError::invalid_configuration("Sampling stride must be at least 1"));
    }
    Ok(())
}

/// Validate a multi-resolution schedule.
pub fn validate_schedule(schedule: &[PyramidLevel]) -> Result<()> {
    if schedule.is_empty() {
        return Err(RegistrationError::invalid_configuration(
            "Schedule must contain at least one level",
        ));
    }
    for (i, level) in schedule.iter().enumerate() {
        if level.shrink_factor == 0 {
            return Err(RegistrationError::invalid_configuration(format!(
                "Level {} has shrink factor 0",
                i
            )));
        }
        if !level.smoothing_sigma_mm.is_finite() || level.smoothing_sigma_mm < 0.0 {
            return Err(RegistrationError::invalid_configuration(format!(
                "Level {} has invalid smoothing sigma {}",
                i, level.smoothing_sigma_mm
            )));
        }
    }
    Ok(())
}

/// Validate explicit parameter scales.
pub fn validate_parameter_scales(scales: &[f64; 6]) -> Result<()> {
    if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Parameter scales must be positive, got {:?}",
            scales
        )));
    }
    Ok(())
}

/// Require a usable intensity range, returning `(min, max)`.
pub fn validate_intensity_range<B: Backend>(image: &Image<B>, label: &str) -> Result<(f64, f64)> {
    let (min, max) = image.intensity_range();
    if !min.is_finite() || !max.is_finite() {
        return Err(RegistrationError::insufficient_overlap(format!(
            "{} volume contains non-finite intensities",
            label
        )));
    }
    if max - min <= f64::from(f32::EPSILON) * max.abs().max(1.0) {
        return Err(RegistrationError::insufficient_overlap(format!(
            "{} volume has constant intensity {}",
            label, min
        )));
    }
    Ok((min, max))
}

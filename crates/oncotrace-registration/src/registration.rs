//! Multi-resolution rigid registration.

use std::sync::Arc;

use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use nalgebra::Vector6;
use oncotrace_core::filter::MultiResolutionPyramid;
use oncotrace_core::{CancellationToken, Image, Point3, RigidTransform, VersorRigid3DTransform};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RegistrationConfig;
use crate::error::{RegistrationError, Result};
use crate::initializer::initial_transform;
use crate::metric::{FixedSamples, Metric, MutualInformation};
use crate::optimizer::{RegularStepGradientDescent, StepState, StopReason};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::scales::resolve_parameter_scales;
use crate::validation::validate_intensity_range;

/// How a registration run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Iterations over all levels.
    pub iterations: usize,
    /// Cost of the returned transform at the finest level.
    pub final_cost: f64,
    /// Why the finest level stopped.
    pub stop_reason: StopReason,
    /// `true` when the finest level met a convergence criterion, `false` when
    /// it ran into the iteration limit.
    pub converged: bool,
    /// Iterations spent per level, coarse to fine.
    pub level_iterations: Vec<usize>,
}

/// Rigid registration of a moving volume onto a fixed one by maximizing
/// mutual information.
///
/// The returned transform maps fixed-space physical points into moving space.
#[derive(Debug, Clone)]
pub struct Registrar {
    config: RegistrationConfig,
    progress: ProgressTracker,
    cancel: Option<CancellationToken>,
}

impl Registrar {
    /// Create a registrar, rejecting invalid configuration.
    pub fn new(config: RegistrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress: ProgressTracker::new(),
            cancel: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress.add_callback(callback);
        self
    }

    /// Check `token` between iterations and stop with [`RegistrationError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Register `moving` onto `fixed` starting from the configured initialization.
    pub fn align<B: AutodiffBackend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
    ) -> Result<(RigidTransform, ConvergenceInfo)> {
        let initial = initial_transform(self.config.initialization, fixed, moving);
        self.align_from(fixed, moving, initial)
    }

    /// Register starting from a caller-supplied transform.
    ///
    /// The rotation center of `initial` is kept throughout.
    pub fn align_from<B: AutodiffBackend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        initial: RigidTransform,
    ) -> Result<(RigidTransform, ConvergenceInfo)> {
        self.progress.start();
        let result = self.run(fixed, moving, initial);
        match &result {
            Ok((_, info)) => self.progress.complete(info.iterations, info.final_cost),
            Err(e) => self.progress.error(&e.to_string()),
        }
        result
    }

    /// Cost of `transform` at full resolution, without gradients.
    pub fn evaluate_cost<B: Backend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        transform: &RigidTransform,
    ) -> Result<f64> {
        let fixed_range = validate_intensity_range(fixed, "fixed")?;
        let moving_range = validate_intensity_range(moving, "moving")?;
        let metric = MutualInformation::new(
            self.config.histogram_bins,
            self.config.parzen_sigma_bins,
            fixed_range,
            moving_range,
        );
        let samples = level_samples(fixed, &self.config);
        let tensor_transform = VersorRigid3DTransform::<B>::from_rigid(transform, &fixed.data().device());

        let value = metric.evaluate(&samples, moving, &tensor_transform);
        self.check_overlap(value.inside_fraction)?;
        Ok(value.cost.into_scalar().elem::<f64>())
    }

    fn run<B: AutodiffBackend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        initial: RigidTransform,
    ) -> Result<(RigidTransform, ConvergenceInfo)> {
        self.check_cancelled()?;
        validate_intensity_range(fixed, "fixed")?;
        validate_intensity_range(moving, "moving")?;

        let schedule = &self.config.schedule;
        let center = *initial.center();
        let scales = resolve_parameter_scales(self.config.parameter_scales, fixed.geometry());
        let optimizer = RegularStepGradientDescent::new(&self.config, scales);

        let fixed_pyramid = MultiResolutionPyramid::new(fixed, schedule);
        let moving_pyramid = MultiResolutionPyramid::new(moving, schedule);
        let levels = fixed_pyramid.levels();

        let initial_parameters = initial.parameters();
        let mut parameters = initial_parameters;
        let mut level_iterations = Vec::with_capacity(levels);
        let mut last: Option<LevelOutcome> = None;

        for level in 0..levels {
            let (fixed_level, moving_level) =
                match (fixed_pyramid.get_level(level), moving_pyramid.get_level(level)) {
                    (Some(f), Some(m)) => (f, m),
                    _ => {
                        return Err(RegistrationError::invalid_configuration(format!(
                            "pyramid level {} is missing",
                            level
                        )))
                    }
                };

            let context = LevelContext::new(fixed_level, moving_level, &center, &self.config);
            info!(
                level,
                shrink = schedule[level].shrink_factor,
                shape = ?fixed_level.shape(),
                samples = context.samples.len(),
                "Starting registration level {}/{}",
                level + 1,
                levels
            );

            // The finest level starts from whichever of the coarse result and the
            // initial transform scores better at full detail.
            let is_finest = level + 1 == levels;
            let (start, first) = if is_finest && level > 0 {
                let min_overlap = self.config.min_overlap_fraction;
                let coarse = context.evaluate(&parameters);
                let at_initial = context.evaluate(&initial_parameters);
                match (coarse.is_usable(min_overlap), at_initial.is_usable(min_overlap)) {
                    (true, true) if at_initial.cost < coarse.cost => {
                        debug!(coarse = coarse.cost, initial = at_initial.cost, "Coarse result discarded");
                        (initial_parameters, at_initial)
                    }
                    (false, true) => (initial_parameters, at_initial),
                    _ => (parameters, coarse),
                }
            } else {
                let first = context.evaluate(&parameters);
                (parameters, first)
            };

            if first.inside_fraction < self.config.min_overlap_fraction {
                return Err(RegistrationError::insufficient_overlap(format!(
                    "only {:.1}% of fixed samples map inside the moving volume at level {}",
                    first.inside_fraction * 100.0,
                    level
                )));
            }

            let outcome = self.run_level(level, &context, &optimizer, start, first, &level_iterations)?;
            level_iterations.push(outcome.iterations);
            parameters = outcome.best_parameters;
            last = Some(outcome);
        }

        let outcome = match last {
            Some(outcome) => outcome,
            None => {
                return Err(RegistrationError::invalid_configuration(
                    "schedule produced no levels",
                ))
            }
        };

        let transform = RigidTransform::from_parameters(&outcome.best_parameters, center);
        let convergence = ConvergenceInfo {
            iterations: level_iterations.iter().sum(),
            final_cost: outcome.best_cost,
            stop_reason: outcome.stop_reason,
            converged: outcome.stop_reason.is_converged(),
            level_iterations,
        };

        info!(
            iterations = convergence.iterations,
            final_cost = convergence.final_cost,
            stop_reason = ?convergence.stop_reason,
            rotation_deg = transform.rotation_angle().to_degrees(),
            translation = ?transform.translation().to_array(),
            "Registration finished"
        );

        Ok((transform, convergence))
    }

    fn run_level<B: AutodiffBackend>(
        &self,
        level: usize,
        context: &LevelContext<'_, B>,
        optimizer: &RegularStepGradientDescent,
        start: Vector6<f64>,
        first: Evaluation,
        previous_levels: &[usize],
    ) -> Result<LevelOutcome> {
        let min_overlap = self.config.min_overlap_fraction;
        let mut state: StepState = optimizer.start(start);
        let mut pending = Some(first);

        let stop_reason = loop {
            self.check_cancelled()?;

            let evaluation = match pending.take() {
                Some(evaluation) => evaluation,
                None => context.evaluate(&state.parameters),
            };

            let (next, stop) = if evaluation.is_usable(min_overlap) {
                optimizer.step(state, evaluation.cost, &evaluation.gradient)
            } else {
                debug!(
                    level,
                    inside = evaluation.inside_fraction,
                    "Step left the overlap region, reverting"
                );
                optimizer.reject(state)
            };
            state = next;

            debug!(
                level,
                iteration = state.iteration,
                cost = evaluation.cost,
                step = state.learning_rate,
                "Registration iteration"
            );
            self.progress.update(
                level,
                state.iteration,
                self.config.max_iterations,
                evaluation.cost,
                state.learning_rate,
            );

            if let Some(reason) = stop {
                break reason;
            }
            if state.is_diverging(self.config.divergence_patience) {
                return Err(RegistrationError::Divergence {
                    iterations: previous_levels.iter().sum::<usize>() + state.iteration,
                    stagnant_iterations: state.stagnant_iterations,
                    best_cost: state.best_cost,
                });
            }
        };

        if stop_reason == StopReason::MaximumIterations {
            warn!(
                level,
                iterations = state.iteration,
                best_cost = state.best_cost,
                "Iteration limit reached before convergence"
            );
        } else {
            info!(
                level,
                iterations = state.iteration,
                best_cost = state.best_cost,
                reason = ?stop_reason,
                "Level converged"
            );
        }

        Ok(LevelOutcome {
            best_parameters: state.best_parameters,
            best_cost: state.best_cost,
            iterations: state.iteration,
            stop_reason,
        })
    }

    fn check_overlap(&self, inside_fraction: f64) -> Result<()> {
        if inside_fraction < self.config.min_overlap_fraction {
            return Err(RegistrationError::insufficient_overlap(format!(
                "only {:.1}% of fixed samples map inside the moving volume",
                inside_fraction * 100.0
            )));
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(RegistrationError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Strided fixed samples, randomly thinned to the configured budget.
fn level_samples<B: Backend>(fixed: &Image<B>, config: &RegistrationConfig) -> FixedSamples<B> {
    let samples = FixedSamples::new(fixed, config.sampling_stride);
    let count = config.sample_count(samples.len());
    if count < samples.len() {
        debug!(available = samples.len(), kept = count, "Subsampling metric samples");
    }
    samples.subsample(count, config.sampling_seed)
}

struct LevelOutcome {
    best_parameters: Vector6<f64>,
    best_cost: f64,
    iterations: usize,
    stop_reason: StopReason,
}

/// Cost, gradient and overlap at one parameter vector.
struct Evaluation {
    cost: f64,
    gradient: Vector6<f64>,
    inside_fraction: f64,
}

impl Evaluation {
    fn is_usable(&self, min_overlap: f64) -> bool {
        self.inside_fraction >= min_overlap
            && self.cost.is_finite()
            && self.gradient.iter().all(|g| g.is_finite())
    }
}

/// Per-level images, samples and metric.
struct LevelContext<'a, B: AutodiffBackend> {
    moving: &'a Image<B>,
    samples: FixedSamples<B>,
    metric: MutualInformation,
    center: Tensor<B, 1>,
}

impl<'a, B: AutodiffBackend> LevelContext<'a, B> {
    fn new(
        fixed: &Image<B>,
        moving: &'a Image<B>,
        center: &Point3,
        config: &RegistrationConfig,
    ) -> Self {
        let device = fixed.data().device();
        Self {
            moving,
            samples: level_samples(fixed, config),
            metric: MutualInformation::for_images(
                fixed,
                moving,
                config.histogram_bins,
                config.parzen_sigma_bins,
            ),
            center: Tensor::from_floats(center.to_f32_array(), &device),
        }
    }

    fn evaluate(&self, parameters: &Vector6<f64>) -> Evaluation {
        let device = self.center.device();
        let values: [f32; 6] = std::array::from_fn(|i| parameters[i] as f32);
        let tensor = Tensor::<B, 1>::from_floats(values, &device).require_grad();
        let transform = VersorRigid3DTransform::new(tensor.clone(), self.center.clone());

        let value = self.metric.evaluate(&self.samples, self.moving, &transform);
        let cost = value.cost.clone().into_scalar().elem::<f64>();
        let grads = value.cost.backward();

        let gradient = match tensor.grad(&grads) {
            Some(grad) => {
                let g: Vec<f64> = grad.into_data().iter::<f32>().map(f64::from).collect();
                Vector6::from_fn(|i, _| g.get(i).copied().unwrap_or(0.0))
            }
            None => Vector6::zeros(),
        };

        Evaluation {
            cost,
            gradient,
            inside_fraction: value.inside_fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;
    use oncotrace_core::spatial::{Direction3, Spacing3};

    type B = Autodiff<NdArray<f32>>;

    fn ball(center: [f64; 3]) -> Image<B> {
        let n = 12;
        let mut values = Vec::with_capacity(n * n * n);
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let d2 = (x as f64 - center[0]).powi(2)
                        + (y as f64 - center[1]).powi(2)
                        + (z as f64 - center[2]).powi(2);
                    values.push((10.0 + 90.0 * (-d2 / 8.0).exp()) as f32);
                }
            }
        }
        Image::from_vec(
            values,
            [n, n, n],
            Point3::origin(),
            Spacing3::uniform(1.0),
            Direction3::identity(),
            &Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let config = RegistrationConfig::default().with_histogram_bins(1);
        assert!(matches!(
            Registrar::new(config),
            Err(RegistrationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let registrar = Registrar::new(RegistrationConfig::single_level())
            .unwrap()
            .with_cancellation(token);

        let image = ball([5.5, 5.5, 5.5]);
        assert_eq!(
            registrar.align(&image, &image).unwrap_err(),
            RegistrationError::Cancelled
        );
    }

    #[test]
    fn test_result_not_worse_than_start() {
        let fixed = ball([5.5, 5.5, 5.5]);
        let moving = ball([6.5, 5.5, 5.5]);
        let registrar = Registrar::new(
            RegistrationConfig::single_level()
                .with_max_iterations(15)
                .with_histogram_bins(24),
        )
        .unwrap();

        let (transform, info) = registrar.align(&fixed, &moving).unwrap();
        let identity = RigidTransform::identity(fixed.physical_center());

        let start_cost = registrar.evaluate_cost(&fixed, &moving, &identity).unwrap();
        let end_cost = registrar.evaluate_cost(&fixed, &moving, &transform).unwrap();
        assert!(end_cost <= start_cost + 1e-4, "{} > {}", end_cost, start_cost);
        assert_eq!(info.level_iterations.len(), 1);
        assert!(info.iterations <= 15);
    }
}

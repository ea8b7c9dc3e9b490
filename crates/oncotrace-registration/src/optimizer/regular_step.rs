//! Regular-step gradient descent.
//!
//! The step length stays fixed until the gradient direction reverses, then it
//! is multiplied by the relaxation factor. Optimization stops once the step
//! length or the scaled gradient becomes negligible.

use nalgebra::Vector6;
use serde::{Deserialize, Serialize};

use crate::config::RegistrationConfig;

/// Why an optimization level stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The step length fell below the configured minimum.
    StepTooSmall,
    /// The scaled gradient magnitude fell below the tolerance.
    GradientTolerance,
    /// The iteration limit was reached before any criterion was met.
    MaximumIterations,
}

impl StopReason {
    /// Whether the stop came from a convergence criterion rather than the limit.
    pub fn is_converged(self) -> bool {
        !matches!(self, StopReason::MaximumIterations)
    }
}

/// Optimizer state carried from one iteration to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct StepState {
    /// Parameters to evaluate next.
    pub parameters: Vector6<f64>,
    /// Parameters before the most recent step.
    pub last_parameters: Vector6<f64>,
    /// Current step length.
    pub learning_rate: f64,
    /// Scaled gradient of the previous accepted iteration.
    pub previous_gradient: Option<Vector6<f64>>,
    /// Iterations consumed, including rejected ones.
    pub iteration: usize,
    /// Consecutive iterations without a new best cost.
    pub stagnant_iterations: usize,
    /// Number of step length reductions so far.
    pub relaxations: usize,
    /// Lowest cost seen.
    pub best_cost: f64,
    /// Parameters that produced `best_cost`.
    pub best_parameters: Vector6<f64>,
}

impl StepState {
    /// Fresh state at `parameters` with the initial step length.
    pub fn new(parameters: Vector6<f64>, learning_rate: f64) -> Self {
        Self {
            parameters,
            last_parameters: parameters,
            learning_rate,
            previous_gradient: None,
            iteration: 0,
            stagnant_iterations: 0,
            relaxations: 0,
            best_cost: f64::INFINITY,
            best_parameters: parameters,
        }
    }

    /// Cost stopped improving for `patience` iterations after a relaxation.
    pub fn is_diverging(&self, patience: usize) -> bool {
        self.relaxations > 0 && self.stagnant_iterations >= patience
    }
}

/// Regular-step gradient descent over the six rigid parameters.
#[derive(Debug, Clone)]
pub struct RegularStepGradientDescent {
    learning_rate: f64,
    min_step_length: f64,
    relaxation_factor: f64,
    gradient_tolerance: f64,
    max_iterations: usize,
    scales: Vector6<f64>,
}

impl RegularStepGradientDescent {
    pub fn new(config: &RegistrationConfig, scales: Vector6<f64>) -> Self {
        Self {
            learning_rate: config.learning_rate,
            min_step_length: config.min_step_length,
            relaxation_factor: config.relaxation_factor,
            gradient_tolerance: config.gradient_tolerance,
            max_iterations: config.max_iterations,
            scales,
        }
    }

    /// Initial state for a level starting at `parameters`.
    pub fn start(&self, parameters: Vector6<f64>) -> StepState {
        StepState::new(parameters, self.learning_rate)
    }

    pub fn scales(&self) -> &Vector6<f64> {
        &self.scales
    }

    /// Advance one iteration given the cost and raw gradient at `state.parameters`.
    ///
    /// The gradient must be finite. Returns the next state and, if the level
    /// is finished, why.
    pub fn step(
        &self,
        state: StepState,
        cost: f64,
        gradient: &Vector6<f64>,
    ) -> (StepState, Option<StopReason>) {
        let mut next = state;
        next.iteration += 1;
        self.record_cost(&mut next, cost);

        let scaled = gradient.component_div(&self.scales);
        let magnitude = scaled.norm();
        if magnitude < self.gradient_tolerance {
            return (next, Some(StopReason::GradientTolerance));
        }

        if let Some(previous) = next.previous_gradient {
            if scaled.dot(&previous) < 0.0 {
                next.learning_rate *= self.relaxation_factor;
                next.relaxations += 1;
            }
        }
        next.previous_gradient = Some(scaled);

        if next.learning_rate < self.min_step_length {
            return (next, Some(StopReason::StepTooSmall));
        }

        // Unit step in scaled space, mapped back to raw parameters.
        let step = (scaled * (-next.learning_rate / magnitude)).component_div(&self.scales);
        next.last_parameters = next.parameters;
        next.parameters += step;

        let stop = self.limit_reached(&next);
        (next, stop)
    }

    /// Undo the last step after it produced an unusable evaluation.
    ///
    /// The parameters return to the previous point and the step length is
    /// relaxed so the retry lands closer.
    pub fn reject(&self, state: StepState) -> (StepState, Option<StopReason>) {
        let mut next = state;
        next.iteration += 1;
        next.stagnant_iterations += 1;
        next.parameters = next.last_parameters;
        next.learning_rate *= self.relaxation_factor;
        next.relaxations += 1;

        if next.learning_rate < self.min_step_length {
            return (next, Some(StopReason::StepTooSmall));
        }
        let stop = self.limit_reached(&next);
        (next, stop)
    }

    fn record_cost(&self, state: &mut StepState, cost: f64) {
        if cost < state.best_cost {
            state.best_cost = cost;
            state.best_parameters = state.parameters;
            state.stagnant_iterations = 0;
        } else {
            state.stagnant_iterations += 1;
        }
    }

    fn limit_reached(&self, state: &StepState) -> Option<StopReason> {
        (state.iteration >= self.max_iterations).then_some(StopReason::MaximumIterations)
    }
}

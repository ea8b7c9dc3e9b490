//! Optimizers for the rigid registration parameters.
//!
//! The optimizer works on host-side `Vector6` parameters; gradients come from
//! one autodiff pass per iteration and the state is passed by value.

pub mod regular_step;

pub use regular_step::{RegularStepGradientDescent, StepState, StopReason};

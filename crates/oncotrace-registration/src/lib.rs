//! Rigid registration of longitudinal volumes.
//!
//! [`Registrar`] aligns a moving volume onto a fixed one by maximizing Parzen
//! window mutual information with regular-step gradient descent over a
//! multi-resolution pyramid. Gradients come from burn's autodiff backend.

pub mod config;
pub mod error;
pub mod initializer;
pub mod metric;
pub mod optimizer;
pub mod progress;
pub mod quality;
pub mod registration;
pub mod scales;
pub mod validation;

pub use config::{RegistrationConfig, TransformInitialization};
pub use error::{RegistrationError, Result};
pub use initializer::{initial_transform, moments_transform};
pub use optimizer::{RegularStepGradientDescent, StepState, StopReason};
pub use progress::{HistoryCallback, ProgressCallback, ProgressInfo, ProgressTracker, TracingProgressCallback};
pub use quality::{alignment_quality, resampled_correlation};
pub use registration::{ConvergenceInfo, Registrar};
pub use scales::estimate_parameter_scales;

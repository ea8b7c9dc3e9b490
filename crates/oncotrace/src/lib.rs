//! Longitudinal tumor comparison.
//!
//! [`LongitudinalPipeline`] registers a follow-up scan onto a baseline scan,
//! segments the tumor at both time points and quantifies the change between
//! them. The stage crates are re-exported for callers that need them
//! individually.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::LongitudinalPipeline;
pub use report::{PipelineOutcome, PipelineReport, PipelineSummary};

pub use oncotrace_analysis;
pub use oncotrace_core;
pub use oncotrace_registration;
pub use oncotrace_segmentation;

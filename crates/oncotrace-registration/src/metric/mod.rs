//! Similarity metrics.
//!
//! Only mutual information is provided: it tolerates the intensity drift
//! between acquisitions that makes squared-difference metrics unreliable.

pub mod trait_;
pub mod sampling;
pub mod histogram;
pub mod mutual_information;

pub use trait_::{Metric, MetricValue};
pub use sampling::FixedSamples;
pub use histogram::ParzenJointHistogram;
pub use mutual_information::MutualInformation;

//! Longitudinal change analysis between two tumor masks.
//!
//! [`ChangeAnalyzer`] reports volumes, Dice and Jaccard overlap and a
//! voxel-wise [`ChangeMap`] of regression, progression and stable tissue.

pub mod analyzer;
pub mod change_map;
pub mod error;
pub mod overlap;

pub use analyzer::{AnalysisResult, ChangeAnalyzer, ChangeFractions, GEOMETRY_TOLERANCE};
pub use change_map::{ChangeClass, ChangeCounts, ChangeMap};
pub use error::{AnalysisError, Result};
pub use overlap::OverlapCounts;

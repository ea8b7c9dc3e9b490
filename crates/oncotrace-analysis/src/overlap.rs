//! Overlap coefficients between two voxel sets.

use serde::{Deserialize, Serialize};

/// Voxel counts of two masks and their overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverlapCounts {
    pub first: usize,
    pub second: usize,
    pub intersection: usize,
    pub union: usize,
}

impl OverlapCounts {
    /// Counts from the sizes of both sets and their intersection.
    pub fn new(first: usize, second: usize, intersection: usize) -> Self {
        Self {
            first,
            second,
            intersection,
            union: first + second - intersection,
        }
    }

    /// `2|A∩B| / (|A| + |B|)`, 0 when both sets are empty.
    pub fn dice(&self) -> f64 {
        let total = self.first + self.second;
        if total == 0 {
            return 0.0;
        }
        2.0 * self.intersection as f64 / total as f64
    }

    /// `|A∩B| / |A∪B|`, 0 when the union is empty.
    pub fn jaccard(&self) -> f64 {
        if self.union == 0 {
            return 0.0;
        }
        self.intersection as f64 / self.union as f64
    }
}

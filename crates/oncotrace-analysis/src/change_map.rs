//! Voxel-wise classification of change between two masks.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};
use oncotrace_core::{BinaryMask, GridGeometry};
use serde::{Deserialize, Serialize};

/// Change category of one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChangeClass {
    /// In neither mask.
    Background = 0,
    /// Only in the first mask.
    Regression = 1,
    /// Only in the second mask.
    Progression = 2,
    /// In both masks.
    Stable = 3,
}

impl ChangeClass {
    /// Class of a voxel given its membership in each mask.
    pub fn classify(in_first: bool, in_second: bool) -> Self {
        match (in_first, in_second) {
            (false, false) => Self::Background,
            (true, false) => Self::Regression,
            (false, true) => Self::Progression,
            (true, true) => Self::Stable,
        }
    }

    /// Class for a stored label; labels outside 0..=3 map to background.
    pub fn from_label(label: i64) -> Self {
        match label {
            1 => Self::Regression,
            2 => Self::Progression,
            3 => Self::Stable,
            _ => Self::Background,
        }
    }

    pub fn label(self) -> u8 {
        self as u8
    }
}

/// Voxel counts per change class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub background: usize,
    pub regression: usize,
    pub progression: usize,
    pub stable: usize,
}

impl ChangeCounts {
    /// Voxels in either mask.
    pub fn union(&self) -> usize {
        self.regression + self.progression + self.stable
    }

    pub fn first(&self) -> usize {
        self.regression + self.stable
    }

    pub fn second(&self) -> usize {
        self.progression + self.stable
    }
}

/// Per-voxel [`ChangeClass`] labels on the grid of the compared masks.
#[derive(Debug, Clone)]
pub struct ChangeMap<B: Backend> {
    labels: Tensor<B, 3, Int>,
    geometry: GridGeometry,
}

impl<B: Backend> ChangeMap<B> {
    /// Label each voxel as `first + 2 * second`. Both masks must share a grid.
    pub(crate) fn from_masks(first: &BinaryMask<B>, second: &BinaryMask<B>) -> Self {
        let labels = first.data().clone().int() + second.data().clone().int().mul_scalar(2);
        Self {
            labels,
            geometry: *first.geometry(),
        }
    }

    /// Integer labels `[nz, ny, nx]` with the values of [`ChangeClass`].
    pub fn labels(&self) -> &Tensor<B, 3, Int> {
        &self.labels
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn count(&self, class: ChangeClass) -> usize {
        self.labels
            .clone()
            .equal_elem(class.label() as i64)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>() as usize
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            background: self.count(ChangeClass::Background),
            regression: self.count(ChangeClass::Regression),
            progression: self.count(ChangeClass::Progression),
            stable: self.count(ChangeClass::Stable),
        }
    }

    /// Classes in `[nz, ny, nx]` order.
    pub fn to_vec(&self) -> Vec<ChangeClass> {
        self.labels
            .clone()
            .into_data()
            .iter::<i64>()
            .map(ChangeClass::from_label)
            .collect()
    }
}

//! 26-connected component labeling and size filtering.

use crate::config::ComponentSelection;

/// Component labels of a binary volume.
///
/// Label 0 is background; components are numbered from 1 in raster order of
/// their first voxel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabels {
    labels: Vec<u32>,
    sizes: Vec<usize>,
}

impl ComponentLabels {
    /// Per-voxel labels in `[nz, ny, nx]` order.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Voxel count of component `label`, 0 for background or unknown labels.
    pub fn size_of(&self, label: u32) -> usize {
        if label == 0 {
            return 0;
        }
        self.sizes.get(label as usize - 1).copied().unwrap_or(0)
    }

    /// Sizes indexed by `label - 1`.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn num_components(&self) -> usize {
        self.sizes.len()
    }
}

/// Label the 26-connected foreground components of `mask`.
///
/// `shape` is `[nz, ny, nx]`.
pub fn label_components(mask: &[bool], shape: [usize; 3]) -> ComponentLabels {
    let [nz, ny, nx] = shape;
    let mut labels = vec![0u32; mask.len()];
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || labels[start] != 0 {
            continue;
        }
        let label = sizes.len() as u32 + 1;
        labels[start] = label;
        stack.push(start);
        let mut size = 0usize;

        while let Some(idx) = stack.pop() {
            size += 1;
            let z = idx / (nx * ny);
            let y = (idx / nx) % ny;
            let x = idx % nx;

            for dz in -1isize..=1 {
                let Some(zz) = offset(z, dz, nz) else { continue };
                for dy in -1isize..=1 {
                    let Some(yy) = offset(y, dy, ny) else { continue };
                    for dx in -1isize..=1 {
                        let Some(xx) = offset(x, dx, nx) else { continue };
                        let n = (zz * ny + yy) * nx + xx;
                        if mask[n] && labels[n] == 0 {
                            labels[n] = label;
                            stack.push(n);
                        }
                    }
                }
            }
        }
        sizes.push(size);
    }

    ComponentLabels { labels, sizes }
}

/// Foreground mask of the components kept by `selection` with at least
/// `min_size` voxels.
pub fn filter_components(
    components: &ComponentLabels,
    min_size: usize,
    selection: ComponentSelection,
) -> Vec<bool> {
    let keep = kept_labels(components, min_size, selection);
    components
        .labels
        .iter()
        .map(|&label| label != 0 && keep[label as usize - 1])
        .collect()
}

/// Number of components `filter_components` would keep.
pub fn count_kept(components: &ComponentLabels, min_size: usize, selection: ComponentSelection) -> usize {
    kept_labels(components, min_size, selection).iter().filter(|k| **k).count()
}

fn kept_labels(components: &ComponentLabels, min_size: usize, selection: ComponentSelection) -> Vec<bool> {
    let sizes = &components.sizes;
    match selection {
        ComponentSelection::AllAboveMinimum => sizes.iter().map(|&s| s >= min_size).collect(),
        ComponentSelection::LargestOnly => {
            // ties go to the lowest label
            let largest = sizes
                .iter()
                .enumerate()
                .fold(None::<(usize, usize)>, |best, (i, &s)| match best {
                    Some((_, bs)) if bs >= s => best,
                    _ => Some((i, s)),
                });
            let mut keep = vec![false; sizes.len()];
            if let Some((i, s)) = largest {
                keep[i] = s >= min_size;
            }
            keep
        }
    }
}

#[inline]
fn offset(coord: usize, delta: isize, len: usize) -> Option<usize> {
    let moved = coord as isize + delta;
    (moved >= 0 && (moved as usize) < len).then_some(moved as usize)
}

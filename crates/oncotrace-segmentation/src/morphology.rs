//! Binary morphology with a spherical structuring element.

use rayon::prelude::*;

/// Offsets `(dz, dy, dx)` of the voxel ball `dx² + dy² + dz² <= r²`.
pub fn ball_offsets(radius: usize) -> Vec<[isize; 3]> {
    let r = radius as isize;
    let mut offsets = Vec::new();
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy + dz * dz <= r * r {
                    offsets.push([dz, dy, dx]);
                }
            }
        }
    }
    offsets
}

/// Erode `mask` (`[nz, ny, nx]`) with a ball of `radius`.
///
/// A voxel stays foreground when every in-grid voxel of its ball is
/// foreground; voxels beyond the grid count as foreground.
pub fn erode(mask: &[bool], shape: [usize; 3], radius: usize) -> Vec<bool> {
    if radius == 0 {
        return mask.to_vec();
    }
    let offsets = ball_offsets(radius);
    (0..mask.len())
        .into_par_iter()
        .map(|idx| {
            mask[idx]
                && neighbors(idx, shape, &offsets).all(|n| n.map_or(true, |n| mask[n]))
        })
        .collect()
}

/// Dilate `mask` (`[nz, ny, nx]`) with a ball of `radius`.
///
/// Voxels beyond the grid are ignored.
pub fn dilate(mask: &[bool], shape: [usize; 3], radius: usize) -> Vec<bool> {
    if radius == 0 {
        return mask.to_vec();
    }
    let offsets = ball_offsets(radius);
    (0..mask.len())
        .into_par_iter()
        .map(|idx| mask[idx] || neighbors(idx, shape, &offsets).any(|n| n.map_or(false, |n| mask[n])))
        .collect()
}

/// Erosion followed by dilation with the same ball.
pub fn binary_opening(mask: &[bool], shape: [usize; 3], radius: usize) -> Vec<bool> {
    let eroded = erode(mask, shape, radius);
    dilate(&eroded, shape, radius)
}

/// Flat index of each ball neighbor of `idx`, `None` when outside the grid.
fn neighbors<'a>(
    idx: usize,
    shape: [usize; 3],
    offsets: &'a [[isize; 3]],
) -> impl Iterator<Item = Option<usize>> + 'a {
    let [nz, ny, nx] = shape;
    let z = (idx / (nx * ny)) as isize;
    let y = ((idx / nx) % ny) as isize;
    let x = (idx % nx) as isize;
    offsets.iter().map(move |[dz, dy, dx]| {
        let (zz, yy, xx) = (z + dz, y + dy, x + dx);
        if zz < 0 || yy < 0 || xx < 0 || zz >= nz as isize || yy >= ny as isize || xx >= nx as isize {
            None
        } else {
            Some((zz as usize * ny + yy as usize) * nx + xx as usize)
        }
    })
}

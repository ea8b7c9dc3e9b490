//! Parameter scaling for the rigid optimizer.

use nalgebra::Vector6;
use oncotrace_core::GridGeometry;

/// Scales that make a unit change of each parameter move voxels by roughly
/// the same physical distance.
///
/// A versor component `v` rotates points at radius `r` by about `2 r v`, so the
/// rotation scales are twice the grid's half-diagonal and translations keep 1.
pub fn estimate_parameter_scales(geometry: &GridGeometry) -> Vector6<f64> {
    let radius = geometry.half_diagonal().max(1.0);
    let rotation = 2.0 * radius;
    Vector6::new(rotation, rotation, rotation, 1.0, 1.0, 1.0)
}

/// Explicit scales when given, otherwise the estimate for `geometry`.
pub fn resolve_parameter_scales(explicit: Option<[f64; 6]>, geometry: &GridGeometry) -> Vector6<f64> {
    match explicit {
        Some(s) => Vector6::from_row_slice(&s),
        None => estimate_parameter_scales(geometry),
    }
}

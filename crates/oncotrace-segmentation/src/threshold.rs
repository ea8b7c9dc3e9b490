//! Percentile thresholding.

/// Percentile of the strictly positive values, interpolating linearly between
/// order statistics.
///
/// Returns `None` when no value is positive.
pub fn percentile_threshold(values: &[f32], percentile: f64) -> Option<f64> {
    let mut positive: Vec<f64> = values.iter().filter(|v| **v > 0.0).map(|v| f64::from(*v)).collect();
    if positive.is_empty() {
        return None;
    }
    positive.sort_unstable_by(f64::total_cmp);

    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (positive.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(positive[lower] + (positive[upper] - positive[lower]) * fraction)
}

/// Foreground where `value >= threshold`.
pub fn binarize(values: &[f32], threshold: f64) -> Vec<bool> {
    values.iter().map(|v| f64::from(*v) >= threshold).collect()
}

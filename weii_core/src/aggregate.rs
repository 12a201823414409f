//! Reduces a sample window to one weight: median plus a fixed offset.

use crate::error::MeasureError;

/// Median of `samples`; the mean of the two middle values for even counts.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Median of the window plus `adjust_kg`. No rounding or clamping.
pub fn reduce(samples: &[f64], adjust_kg: f64) -> Result<f64, MeasureError> {
    median(samples)
        .map(|m| m + adjust_kg)
        .ok_or(MeasureError::InsufficientData)
}

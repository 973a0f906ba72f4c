//! Order statistics and regression error metrics.
//!
//! Medians use the midpoint of the two central values for even-length input.
//! `NaN` values are skipped by `median_of_present`; every other function expects
//! finite input.

use crate::error::AppError;

/// Median of a slice (sorts a copy). Returns `None` for empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median of the non-`NaN` values of an iterator.
pub fn median_of_present(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let present: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    median(&present)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn std_population(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Median of `|y_true - y_pred|`.
pub fn median_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64, AppError> {
    if y_true.len() != y_pred.len() {
        return Err(AppError::new(
            2,
            format!(
                "Length mismatch: {} labels vs {} predictions.",
                y_true.len(),
                y_pred.len()
            ),
        ));
    }
    let abs_err: Vec<f64> = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .collect();
    if abs_err.iter().any(|e| !e.is_finite()) {
        return Err(AppError::new(4, "Non-finite error while scoring predictions."));
    }
    median(&abs_err).ok_or_else(|| AppError::new(3, "Cannot score an empty prediction set."))
}

//! Reporting utilities: importance ranking and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{FeatureImportance, RankedImportance};
use crate::error::AppError;

/// Sort importances (most important first), normalize them to sum to 1, and
/// add the running cumulative share.
///
/// The sort is stable, so tied features keep their input order. The last
/// cumulative value is pinned to exactly `1.0`.
pub fn rank_importances(rows: &[FeatureImportance]) -> Result<Vec<RankedImportance>, AppError> {
    if rows.is_empty() {
        return Err(AppError::new(3, "Importance table is empty."));
    }
    if let Some(bad) = rows
        .iter()
        .find(|r| !(r.importance.is_finite() && r.importance >= 0.0))
    {
        return Err(AppError::new(
            2,
            format!(
                "Importance for '{}' must be finite and >= 0, got {}.",
                bad.feature, bad.importance
            ),
        ));
    }

    let max = rows.iter().map(|r| r.importance).fold(0.0, f64::max);
    if max <= 0.0 {
        return Err(AppError::new(
            4,
            "Importances sum to zero; cannot normalize.",
        ));
    }
    // Large finite values can overflow the plain sum; rescale by the max first.
    let mut scale = 1.0;
    let mut total: f64 = rows.iter().map(|r| r.importance).sum();
    if !total.is_finite() {
        scale = max;
        total = rows.iter().map(|r| r.importance / max).sum();
    }

    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    let last = sorted.len() - 1;
    let mut cumulative = 0.0;
    let ranked = sorted
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let importance_normalized = (r.importance / scale) / total;
            cumulative += importance_normalized;
            let cumulative_importance = if i == last { 1.0 } else { cumulative.clamp(0.0, 1.0) };
            RankedImportance {
                feature: r.feature,
                importance: r.importance,
                importance_normalized,
                cumulative_importance,
            }
        })
        .collect();

    Ok(ranked)
}

/// Number of features needed for the cumulative importance to exceed
/// `threshold`.
///
/// This is one plus the index of the first row whose cumulative importance is
/// strictly greater than `threshold`; `None` when no row gets there.
pub fn features_for_threshold(ranked: &[RankedImportance], threshold: f64) -> Option<usize> {
    ranked
        .iter()
        .position(|r| r.cumulative_importance > threshold)
        .map(|idx| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[(&str, f64)]) -> Vec<FeatureImportance> {
        values
            .iter()
            .map(|&(f, v)| FeatureImportance {
                feature: f.to_string(),
                importance: v,
            })
            .collect()
    }

    #[test]
    fn ranks_normalizes_and_accumulates() {
        let ranked = rank_importances(&rows(&[("a", 1.0), ("b", 5.0), ("c", 2.0), ("d", 2.0)])).unwrap();

        let names: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d", "a"]);

        let norm: Vec<f64> = ranked.iter().map(|r| r.importance_normalized).collect();
        assert_eq!(norm, vec![0.5, 0.2, 0.2, 0.1]);
        assert!((norm.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        assert!((ranked[0].cumulative_importance - 0.5).abs() < 1e-12);
        assert!((ranked[1].cumulative_importance - 0.7).abs() < 1e-12);
        assert!((ranked[2].cumulative_importance - 0.9).abs() < 1e-12);
        assert_eq!(ranked[3].cumulative_importance, 1.0);
    }

    #[test]
    fn cumulative_is_monotone_and_ends_at_one() {
        let input: Vec<FeatureImportance> = (0..37)
            .map(|i| FeatureImportance {
                feature: format!("f{i}"),
                importance: ((i * 7919) % 101) as f64 / 13.0 + 0.001,
            })
            .collect();
        let ranked = rank_importances(&input).unwrap();

        assert_eq!(ranked.len(), input.len());
        let sum: f64 = ranked.iter().map(|r| r.importance_normalized).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for pair in ranked.windows(2) {
            assert!(pair[1].cumulative_importance >= pair[0].cumulative_importance);
            assert!(pair[1].cumulative_importance <= 1.0);
        }
        assert_eq!(ranked.last().unwrap().cumulative_importance, 1.0);
    }

    #[test]
    fn huge_importances_still_normalize() {
        let ranked = rank_importances(&rows(&[("a", 1e308), ("b", 1e308), ("c", 0.0)])).unwrap();

        let norm: Vec<f64> = ranked.iter().map(|r| r.importance_normalized).collect();
        assert_eq!(norm, vec![0.5, 0.5, 0.0]);
        assert_eq!(ranked[0].cumulative_importance, 0.5);
        assert_eq!(ranked[2].cumulative_importance, 1.0);
        assert_eq!(ranked[0].importance, 1e308);
    }

    #[test]
    fn threshold_lookup_is_strictly_greater() {
        let ranked = rank_importances(&rows(&[("a", 5.0), ("b", 3.0), ("c", 2.0)])).unwrap();
        // cumulative = [0.5, 0.8, 1.0]
        assert_eq!(features_for_threshold(&ranked, 0.4), Some(1));
        assert_eq!(features_for_threshold(&ranked, 0.5), Some(2));
        assert_eq!(features_for_threshold(&ranked, 0.9), Some(3));
        assert_eq!(features_for_threshold(&ranked, 1.0), None);
    }

    #[test]
    fn zero_total_and_bad_values_are_rejected() {
        assert_eq!(rank_importances(&rows(&[("a", 0.0)])).unwrap_err().exit_code(), 4);
        assert_eq!(rank_importances(&rows(&[("a", -1.0)])).unwrap_err().exit_code(), 2);
        assert_eq!(rank_importances(&rows(&[("a", f64::NAN)])).unwrap_err().exit_code(), 2);
        assert_eq!(rank_importances(&[]).unwrap_err().exit_code(), 3);
    }
}

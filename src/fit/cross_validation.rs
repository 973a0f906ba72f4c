//! K-fold cross-validation.
//!
//! Folds are contiguous and unshuffled: with `n` samples and `k` folds the
//! first `n % k` folds hold `n / k + 1` samples and the rest hold `n / k`.
//! Every sample lands in exactly one test fold.

use nalgebra::DMatrix;
use tracing::debug;

use crate::domain::{CvSummary, ForestParams};
use crate::error::AppError;
use crate::forest::RandomForestRegressor;
use crate::math::{mean, median_absolute_error, std_population};

/// One train/test partition of `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Generate contiguous K-fold splits.
pub fn k_fold(n_samples: usize, n_folds: usize) -> Result<Vec<FoldSplit>, AppError> {
    if n_folds < 2 {
        return Err(AppError::new(2, format!("Folds must be >= 2, got {n_folds}.")));
    }
    if n_samples < n_folds {
        return Err(AppError::new(
            3,
            format!("Cannot make {n_folds} folds from {n_samples} samples."),
        ));
    }

    let base = n_samples / n_folds;
    let remainder = n_samples % n_folds;

    let mut splits = Vec::with_capacity(n_folds);
    let mut start = 0;
    for fold in 0..n_folds {
        let size = if fold < remainder { base + 1 } else { base };
        let end = start + size;
        let test: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n_samples).collect();
        splits.push(FoldSplit { fold, train, test });
        start = end;
    }
    Ok(splits)
}

/// Score a forest on each held-out fold with median absolute error.
///
/// `x` must already be imputed.
pub fn cross_validate(
    params: &ForestParams,
    x: &DMatrix<f64>,
    y: &[f64],
    n_folds: usize,
) -> Result<CvSummary, AppError> {
    if x.nrows() != y.len() {
        return Err(AppError::new(
            2,
            format!("Shape mismatch: {} rows vs {} labels.", x.nrows(), y.len()),
        ));
    }

    let mut fold_scores = Vec::with_capacity(n_folds);
    for split in k_fold(y.len(), n_folds)? {
        let x_train = x.select_rows(split.train.iter());
        let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();
        let x_test = x.select_rows(split.test.iter());
        let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();

        let forest = RandomForestRegressor::fit(params, &x_train, &y_train)?;
        let preds = forest.predict(&x_test)?;
        let score = median_absolute_error(&y_test, &preds)?;
        debug!(fold = split.fold, n_test = y_test.len(), score, "cross-validation fold");
        fold_scores.push(score);
    }

    let mean = mean(&fold_scores).unwrap_or(f64::NAN);
    let std = std_population(&fold_scores).unwrap_or(f64::NAN);
    Ok(CvSummary {
        fold_scores,
        mean,
        std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_every_sample_once() {
        let splits = k_fold(12, 5).unwrap();
        assert_eq!(splits.len(), 5);

        let sizes: Vec<usize> = splits.iter().map(|s| s.test.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2, 2]);

        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());

        for s in &splits {
            assert_eq!(s.train.len() + s.test.len(), 12);
            assert!(s.test.iter().all(|i| !s.train.contains(i)));
        }
    }

    #[test]
    fn folds_are_contiguous() {
        let splits = k_fold(10, 5).unwrap();
        assert_eq!(splits[1].test, vec![2, 3]);
        assert_eq!(splits[1].train, vec![0, 1, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        assert_eq!(k_fold(3, 5).unwrap_err().exit_code(), 3);
        assert_eq!(k_fold(10, 1).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn cross_validate_reports_one_score_per_fold() {
        let n = 40;
        let data: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let x = DMatrix::from_row_slice(n, 1, &data);
        let y: Vec<f64> = data.iter().map(|v| 3.0 * v).collect();
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };

        let cv = cross_validate(&params, &x, &y, 4).unwrap();
        assert_eq!(cv.fold_scores.len(), 4);
        assert!(cv.fold_scores.iter().all(|s| s.is_finite() && *s >= 0.0));
        assert!(cv.std >= 0.0);
        let expected_mean = cv.fold_scores.iter().sum::<f64>() / 4.0;
        assert!((cv.mean - expected_mean).abs() < 1e-12);
    }
}

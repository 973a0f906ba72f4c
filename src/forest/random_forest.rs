//! Bootstrap-aggregated regression forest.
//!
//! Each tree gets its own `StdRng` seeded with `seed + tree_index`, so the
//! fitted forest is identical no matter how rayon schedules the trees.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::domain::ForestParams;
use crate::error::AppError;
use crate::forest::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForestRegressor {
    /// Fit `params.n_trees` trees in parallel.
    pub fn fit(params: &ForestParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AppError::new(
                2,
                format!("Shape mismatch: {n_samples} rows vs {} labels.", y.len()),
            ));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AppError::new(
                3,
                format!("Cannot fit a forest on a {n_samples}x{n_features} table."),
            ));
        }
        if params.n_trees == 0 {
            return Err(AppError::new(2, "Number of trees must be > 0."));
        }
        if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
            return Err(AppError::new(2, format!("Labels must be finite, found {bad}.")));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::new(
                2,
                "Feature table contains missing or infinite values; impute first.",
            ));
        }

        let tree_params = TreeParams {
            max_features: match params.max_features {
                Some(0) => return Err(AppError::new(2, "max_features must be > 0.")),
                Some(k) => k.min(n_features),
                None => n_features,
            },
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
        };

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                RegressionTree::fit(x, y, samples, tree_params, &mut rng)
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let importances = average_importances(&trees, n_features);
        debug!(
            n_trees = trees.len(),
            n_samples,
            n_features,
            max_depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            leaves = trees.iter().map(RegressionTree::n_leaves).sum::<usize>(),
            "fitted random forest"
        );

        Ok(Self {
            trees,
            n_features,
            importances,
        })
    }

    /// Mean of the per-tree importances, renormalized to sum to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Average of the tree predictions for every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if x.ncols() != self.n_features {
            return Err(AppError::new(
                2,
                format!(
                    "Forest was fitted on {} features, got {}.",
                    self.n_features,
                    x.ncols()
                ),
            ));
        }

        let n_trees = self.trees.len() as f64;
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row: Vec<f64> = x.row(i).iter().copied().collect();
                self.trees.iter().map(|t| t.predict_row(&row)).sum::<f64>() / n_trees
            })
            .collect();

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(AppError::new(4, "Non-finite forest prediction."));
        }
        Ok(predictions)
    }
}

fn average_importances(trees: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut total = vec![0.0; n_features];
    for tree in trees {
        for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
            *acc += v;
        }
    }
    let n_trees = trees.len() as f64;
    total.iter_mut().for_each(|v| *v /= n_trees);

    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        total.iter_mut().for_each(|v| *v /= sum);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = 10 * x0 + noise-free step on x1; x2 is irrelevant.
    fn dataset() -> (DMatrix<f64>, Vec<f64>) {
        let n = 60;
        let mut data = Vec::with_capacity(n * 3);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let x0 = i as f64 / n as f64;
            let x1 = if i % 2 == 0 { 0.0 } else { 1.0 };
            let x2 = ((i * 7) % 5) as f64;
            data.extend_from_slice(&[x0, x1, x2]);
            y.push(10.0 * x0 + 2.0 * x1);
        }
        (DMatrix::from_row_slice(n, 3, &data), y)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        }
    }

    #[test]
    fn importances_sum_to_one_and_rank_signal_first() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&small_params(), &x, &y).unwrap();

        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 3);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
        assert!(imp[1] > imp[2]);
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let (x, y) = dataset();
        let a = RandomForestRegressor::fit(&small_params(), &x, &y).unwrap();
        let b = RandomForestRegressor::fit(&small_params(), &x, &y).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn predictions_track_training_labels() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&small_params(), &x, &y).unwrap();
        let preds = forest.predict(&x).unwrap();
        assert_eq!(preds.len(), y.len());
        let max_err = preds
            .iter()
            .zip(&y)
            .map(|(p, t)| (p - t).abs())
            .fold(0.0, f64::max);
        assert!(max_err < 2.0, "max_err={max_err}");
    }

    #[test]
    fn rejects_missing_values() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        let err = RandomForestRegressor::fit(&ForestParams::default(), &x, &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn predict_checks_width() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&small_params(), &x, &y).unwrap();
        let narrow = DMatrix::from_row_slice(1, 2, &[0.0, 0.0]);
        assert_eq!(forest.predict(&narrow).unwrap_err().exit_code(), 2);
    }
}

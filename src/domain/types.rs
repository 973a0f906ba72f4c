//! Shared domain types.
//!
//! Tables are kept in a dense `nalgebra` matrix (rows = samples, columns =
//! features). Missing cells are stored as `NaN` until imputation removes them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A table of named numeric feature columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    names: Vec<String>,
    values: DMatrix<f64>,
}

impl FeatureTable {
    /// Build a table, checking that every column has a name.
    pub fn new(names: Vec<String>, values: DMatrix<f64>) -> Result<Self, AppError> {
        if names.len() != values.ncols() {
            return Err(AppError::new(
                2,
                format!(
                    "Feature name count ({}) does not match column count ({}).",
                    names.len(),
                    values.ncols()
                ),
            ));
        }
        Ok(Self { names, values })
    }

    /// Build a table from row-major rows.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, AppError> {
        let ncols = names.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(AppError::new(
                2,
                format!("Row {i} has {} values, expected {ncols}.", row.len()),
            ));
        }
        let values = DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]);
        Self::new(names, values)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// A new table holding only `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> FeatureTable {
        FeatureTable {
            names: self.names.clone(),
            values: self.values.select_rows(rows.iter()),
        }
    }

    /// Replace `+inf` / `-inf` with `NaN` so they are treated as missing.
    pub fn replace_infinite_with_missing(&mut self) -> usize {
        let mut replaced = 0;
        for v in self.values.iter_mut() {
            if v.is_infinite() {
                *v = f64::NAN;
                replaced += 1;
            }
        }
        replaced
    }

    pub fn count_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Which statistics median imputation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImputeAxis {
    /// Per-feature medians learned from the training table.
    Column,
    /// Each row's missing cells take the median of that row.
    Row,
}

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    /// Features considered per split (`None` = all features).
    pub max_features: Option<usize>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 50,
            max_features: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

/// Configuration for a single `evaluate` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub forest: ForestParams,
    pub folds: usize,
    pub impute_axis: ImputeAxis,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            folds: 5,
            impute_axis: ImputeAxis::Row,
        }
    }
}

/// How ranked importances are shown and saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceConfig {
    pub top_n: usize,
    /// Cumulative share for the "features required" marker.
    pub threshold: Option<f64>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub svg_dir: Option<PathBuf>,
    pub export: Option<PathBuf>,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            top_n: 15,
            threshold: None,
            plot: true,
            plot_width: 60,
            plot_height: 20,
            svg_dir: None,
            export: None,
        }
    }
}

/// One row of a raw importance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// One row of a ranked importance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedImportance {
    pub feature: String,
    pub importance: f64,
    pub importance_normalized: f64,
    pub cumulative_importance: f64,
}

/// Cross-validation scores (median absolute error per fold).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub fold_scores: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation of `fold_scores`.
    pub std: f64,
}

/// Output of `fit::evaluate`.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub predictions: Vec<f64>,
    /// One row per input feature, in input column order.
    pub importances: Vec<FeatureImportance>,
    pub cv: CvSummary,
    pub test_mae: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// Portable JSON summary of an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub config: EvaluateConfig,
    pub n_train: usize,
    pub n_test: usize,
    pub cv: CvSummary,
    pub test_mae: f64,
    pub importances: Vec<RankedImportance>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let names = vec!["a".to_string(), "b".to_string()];
        let err = FeatureTable::from_rows(names, &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn infinities_become_missing() {
        let names = vec!["a".to_string(), "b".to_string()];
        let mut table = FeatureTable::from_rows(
            names,
            &[vec![1.0, f64::INFINITY], vec![f64::NEG_INFINITY, f64::NAN]],
        )
        .unwrap();

        assert_eq!(table.replace_infinite_with_missing(), 2);
        assert_eq!(table.count_missing(), 3);
        assert_eq!(table.values()[(0, 0)], 1.0);
    }

    #[test]
    fn select_rows_keeps_order_and_names() {
        let names = vec!["x".to_string()];
        let table = FeatureTable::from_rows(names, &[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let picked = table.select_rows(&[2, 0]);
        assert_eq!(picked.names(), table.names());
        assert_eq!(picked.nrows(), 2);
        assert_eq!(picked.values()[(0, 0)], 2.0);
        assert_eq!(picked.values()[(1, 0)], 0.0);
    }

    #[test]
    fn evaluate_defaults_use_row_medians() {
        let config = EvaluateConfig::default();
        assert_eq!(config.impute_axis, ImputeAxis::Row);
        assert_eq!(config.folds, 5);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.seed, 50);
    }
}

//! Median imputation of missing feature values.
//!
//! Missing cells are `NaN` (infinities are expected to have been converted to
//! `NaN` beforehand via `FeatureTable::replace_infinite_with_missing`).
//!
//! - `ImputeAxis::Column`: medians are learned per feature on the training
//!   table and reused unchanged for any table transformed later.
//! - `ImputeAxis::Row`: each row is filled from its own median, so there is
//!   nothing to learn; `fit` only records the expected column count.
//!
//! A column (or row) with no present values imputes to `0.0`.

use tracing::warn;

use crate::domain::{FeatureTable, ImputeAxis};
use crate::error::AppError;
use crate::math::median_of_present;

const EMPTY_FILL: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct MedianImputer {
    axis: ImputeAxis,
    n_features: usize,
    /// Per-column medians (column axis only).
    statistics: Vec<f64>,
}

impl MedianImputer {
    /// Learn imputation statistics from `train`.
    pub fn fit(axis: ImputeAxis, train: &FeatureTable) -> Result<Self, AppError> {
        if train.nrows() == 0 {
            return Err(AppError::new(3, "Cannot fit imputer on an empty table."));
        }

        let statistics = match axis {
            ImputeAxis::Column => train
                .values()
                .column_iter()
                .zip(train.names())
                .map(|(col, name)| {
                    median_of_present(col.iter().copied()).unwrap_or_else(|| {
                        warn!(feature = %name, "column has no present values; imputing {EMPTY_FILL}");
                        EMPTY_FILL
                    })
                })
                .collect(),
            ImputeAxis::Row => Vec::new(),
        };

        Ok(Self {
            axis,
            n_features: train.ncols(),
            statistics,
        })
    }

    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    /// Fill every missing cell of `table`.
    pub fn transform(&self, table: &FeatureTable) -> Result<FeatureTable, AppError> {
        if table.ncols() != self.n_features {
            return Err(AppError::new(
                2,
                format!(
                    "Imputer was fitted on {} features, got {}.",
                    self.n_features,
                    table.ncols()
                ),
            ));
        }

        let mut out = table.clone();
        match self.axis {
            ImputeAxis::Column => {
                for (j, mut col) in out.values_mut().column_iter_mut().enumerate() {
                    let fill = self.statistics[j];
                    col.iter_mut().filter(|v| v.is_nan()).for_each(|v| *v = fill);
                }
            }
            ImputeAxis::Row => {
                for mut row in out.values_mut().row_iter_mut() {
                    let fill = median_of_present(row.iter().copied()).unwrap_or(EMPTY_FILL);
                    row.iter_mut().filter(|v| v.is_nan()).for_each(|v| *v = fill);
                }
            }
        }
        Ok(out)
    }

    pub fn fit_transform(
        axis: ImputeAxis,
        train: &FeatureTable,
    ) -> Result<(Self, FeatureTable), AppError> {
        let imputer = Self::fit(axis, train)?;
        let out = imputer.transform(train)?;
        Ok((imputer, out))
    }
}

//! Seeded synthetic regression data.
//!
//! Features are standard normal draws named `feature_0..feature_{p-1}`. The
//! first `informative` features drive the label with descending integer
//! coefficients (`informative, informative - 1, ..., 1`); the remaining
//! features are pure noise. Gaussian label noise is scaled by `noise`, and a
//! `missing_fraction` of feature cells is blanked to `NaN` so the imputation
//! path gets exercised.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::FeatureTable;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub rows: usize,
    pub features: usize,
    pub informative: usize,
    pub noise: f64,
    pub missing_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub table: FeatureTable,
    pub labels: Vec<f64>,
}

pub fn generate_regression(spec: &SyntheticSpec) -> Result<SyntheticData, AppError> {
    if spec.rows == 0 || spec.features == 0 {
        return Err(AppError::new(2, "Synthetic data needs at least one row and one feature."));
    }
    if spec.informative > spec.features {
        return Err(AppError::new(
            2,
            format!(
                "Informative features ({}) cannot exceed total features ({}).",
                spec.informative, spec.features
            ),
        ));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::new(2, "Noise scale must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&spec.missing_fraction) {
        return Err(AppError::new(2, "Missing fraction must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(spec.rows);
    let mut labels = Vec::with_capacity(spec.rows);
    for _ in 0..spec.rows {
        let row: Vec<f64> = (0..spec.features).map(|_| normal.sample(&mut rng)).collect();
        let signal: f64 = row
            .iter()
            .take(spec.informative)
            .enumerate()
            .map(|(j, v)| (spec.informative - j) as f64 * v)
            .sum();
        labels.push(signal + spec.noise * normal.sample(&mut rng));
        rows.push(row);
    }

    // Blank cells after the labels are computed so they stay noise-free.
    if spec.missing_fraction > 0.0 {
        for row in &mut rows {
            for v in row.iter_mut() {
                if rng.gen_bool(spec.missing_fraction) {
                    *v = f64::NAN;
                }
            }
        }
    }

    let names = (0..spec.features).map(|j| format!("feature_{j}")).collect();
    let table = FeatureTable::from_rows(names, &rows)?;
    Ok(SyntheticData { table, labels })
}

impl SyntheticData {
    /// Hold out the last `test_fraction` of rows as the test set.
    pub fn split(
        &self,
        test_fraction: f64,
    ) -> Result<(FeatureTable, Vec<f64>, FeatureTable, Vec<f64>), AppError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(AppError::new(2, "Test fraction must be in (0, 1)."));
        }
        let n = self.labels.len();
        let n_test = ((n as f64) * test_fraction).round() as usize;
        if n_test == 0 || n_test >= n {
            return Err(AppError::new(
                3,
                format!("Test fraction {test_fraction} leaves an empty split of {n} rows."),
            ));
        }
        let n_train = n - n_test;

        let train_idx: Vec<usize> = (0..n_train).collect();
        let test_idx: Vec<usize> = (n_train..n).collect();
        Ok((
            self.table.select_rows(&train_idx),
            self.labels[..n_train].to_vec(),
            self.table.select_rows(&test_idx),
            self.labels[n_train..].to_vec(),
        ))
    }
}

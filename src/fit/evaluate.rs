//! Train, cross-validate, and score a random forest on a train/test pair.

use tracing::{info, warn};

use crate::domain::{EvaluateConfig, Evaluation, FeatureImportance, FeatureTable};
use crate::error::AppError;
use crate::fit::cross_validation::cross_validate;
use crate::forest::RandomForestRegressor;
use crate::impute::MedianImputer;
use crate::math::median_absolute_error;

/// Evaluate a training table with the standard forest model.
///
/// Steps: treat `±inf` as missing, median-impute (statistics learned on
/// `train`), cross-validate on `train`, fit on all of `train`, predict `test`,
/// and score with median absolute error.
///
/// The returned importance table has one row per feature of `train`, in
/// column order.
pub fn evaluate(
    train: &FeatureTable,
    train_labels: &[f64],
    test: &FeatureTable,
    test_labels: &[f64],
    config: &EvaluateConfig,
) -> Result<Evaluation, AppError> {
    validate_shapes(train, train_labels, test, test_labels)?;

    let mut train = train.clone();
    let mut test = test.clone();
    let replaced = train.replace_infinite_with_missing() + test.replace_infinite_with_missing();
    if replaced > 0 {
        warn!(replaced, "treating infinite feature values as missing");
    }

    let feature_names = train.names().to_vec();

    let missing = train.count_missing() + test.count_missing();
    let (imputer, train) = MedianImputer::fit_transform(config.impute_axis, &train)?;
    let test = imputer.transform(&test)?;
    info!(missing, axis = ?config.impute_axis, "median imputation");

    let cv = cross_validate(&config.forest, train.values(), train_labels, config.folds)?;
    info!(
        "{}-fold CV MAE: {:.2} with std: {:.2}",
        config.folds, cv.mean, cv.std
    );

    let model = RandomForestRegressor::fit(&config.forest, train.values(), train_labels)?;
    let predictions = model.predict(test.values())?;

    let test_mae = median_absolute_error(test_labels, &predictions)?;
    info!("Test MAE: {test_mae:.2}.");

    let importances = feature_names
        .into_iter()
        .zip(model.feature_importances())
        .map(|(feature, &importance)| FeatureImportance { feature, importance })
        .collect();

    Ok(Evaluation {
        predictions,
        importances,
        cv,
        test_mae,
        n_train: train.nrows(),
        n_test: test.nrows(),
    })
}

fn validate_shapes(
    train: &FeatureTable,
    train_labels: &[f64],
    test: &FeatureTable,
    test_labels: &[f64],
) -> Result<(), AppError> {
    if train.nrows() != train_labels.len() {
        return Err(AppError::new(
            2,
            format!(
                "Train table has {} rows but {} labels.",
                train.nrows(),
                train_labels.len()
            ),
        ));
    }
    if test.nrows() != test_labels.len() {
        return Err(AppError::new(
            2,
            format!(
                "Test table has {} rows but {} labels.",
                test.nrows(),
                test_labels.len()
            ),
        ));
    }
    if train.ncols() == 0 {
        return Err(AppError::new(3, "Train table has no feature columns."));
    }
    if test.nrows() == 0 {
        return Err(AppError::new(3, "Test table has no rows."));
    }
    if train.names() != test.names() {
        return Err(AppError::new(
            2,
            "Train and test tables must have the same feature columns in the same order.",
        ));
    }
    if train_labels.iter().chain(test_labels).any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "Labels must be finite numbers."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticSpec, generate_regression};
    use crate::domain::ForestParams;

    fn quick_config() -> EvaluateConfig {
        EvaluateConfig {
            forest: ForestParams {
                n_trees: 15,
                ..ForestParams::default()
            },
            ..EvaluateConfig::default()
        }
    }

    fn spec() -> SyntheticSpec {
        SyntheticSpec {
            rows: 120,
            features: 5,
            informative: 2,
            noise: 0.1,
            missing_fraction: 0.05,
            seed: 7,
        }
    }

    #[test]
    fn output_lengths_match_inputs() {
        let data = generate_regression(&spec()).unwrap();
        let (train, y_train, test, y_test) = data.split(0.25).unwrap();

        let eval = evaluate(&train, &y_train, &test, &y_test, &quick_config()).unwrap();

        assert_eq!(eval.predictions.len(), y_test.len());
        assert_eq!(eval.importances.len(), train.ncols());
        assert_eq!(eval.cv.fold_scores.len(), 5);
        assert!(eval.test_mae.is_finite());
        let names: Vec<&str> = eval.importances.iter().map(|r| r.feature.as_str()).collect();
        let expected: Vec<&str> = train.names().iter().map(String::as_str).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn informative_features_dominate_importance() {
        let data = generate_regression(&spec()).unwrap();
        let (train, y_train, test, y_test) = data.split(0.25).unwrap();

        let eval = evaluate(&train, &y_train, &test, &y_test, &quick_config()).unwrap();
        let informative: f64 = eval.importances[..2].iter().map(|r| r.importance).sum();
        assert!(informative > 0.5, "informative share = {informative}");
    }

    #[test]
    fn infinite_values_are_imputed() {
        let names = vec!["a".to_string(), "b".to_string()];
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let a = if i == 3 { f64::INFINITY } else { i as f64 };
                vec![a, (i % 3) as f64]
            })
            .collect();
        let train = FeatureTable::from_rows(names.clone(), &rows).unwrap();
        let y: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let test = FeatureTable::from_rows(names, &[vec![f64::NEG_INFINITY, 1.0]]).unwrap();

        let eval = evaluate(&train, &y, &test, &[5.0], &quick_config()).unwrap();
        assert_eq!(eval.predictions.len(), 1);
        assert!(eval.predictions[0].is_finite());
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let names = vec!["a".to_string()];
        let train = FeatureTable::from_rows(names.clone(), &[vec![1.0], vec![2.0]]).unwrap();
        let test = FeatureTable::from_rows(names, &[vec![1.0]]).unwrap();

        let err = evaluate(&train, &[1.0], &test, &[1.0], &quick_config()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let train = FeatureTable::from_rows(vec!["a".to_string()], &[vec![1.0]]).unwrap();
        let test = FeatureTable::from_rows(vec!["b".to_string()], &[vec![1.0]]).unwrap();

        let err = evaluate(&train, &[1.0], &test, &[1.0], &quick_config()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

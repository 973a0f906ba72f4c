//! Shared pipeline logic behind the `evaluate`, `importances` and `demo`
//! commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load/generate -> impute -> cross-validate -> fit -> predict -> rank
//!
//! The command handlers in `app` then only deal with printing and exports.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::data::{SyntheticSpec, generate_regression};
use crate::domain::{
    EvaluateConfig, Evaluation, FeatureImportance, FeatureTable, ImportanceConfig, RankedImportance,
};
use crate::error::AppError;
use crate::io::ingest::{LabeledTable, read_feature_csv};

/// Ranked importances plus everything rendered from them.
#[derive(Debug, Clone)]
pub struct ImportanceView {
    pub ranked: Vec<RankedImportance>,
    /// Feature count needed to exceed the configured threshold.
    pub required: Option<usize>,
    /// Table, terminal plots and threshold message, ready to print.
    pub rendered: String,
    pub svg_files: Vec<PathBuf>,
}

/// All computed outputs of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluateOutput {
    pub evaluation: Evaluation,
    pub test_labels: Vec<f64>,
    /// `None` when every importance is zero (e.g. a constant label), since
    /// there is nothing to rank.
    pub view: Option<ImportanceView>,
}

/// Load train/test CSVs and evaluate them.
pub fn run_evaluate(
    train_path: &Path,
    test_path: &Path,
    label: &str,
    config: &EvaluateConfig,
    display: &ImportanceConfig,
) -> Result<EvaluateOutput, AppError> {
    let train = read_feature_csv(train_path, label)?;
    let test = read_feature_csv(test_path, label)?;
    let test = align_columns(&train, test)?;

    evaluate_tables(&train.table, &train.labels, &test.table, test.labels, config, display)
}

/// Generate a synthetic dataset, optionally save it, and evaluate it.
pub fn run_demo(
    spec: &SyntheticSpec,
    test_fraction: f64,
    write_dir: Option<&Path>,
    config: &EvaluateConfig,
    display: &ImportanceConfig,
) -> Result<EvaluateOutput, AppError> {
    let data = generate_regression(spec)?;
    let (train, train_labels, test, test_labels) = data.split(test_fraction)?;
    info!(
        rows = spec.rows,
        features = spec.features,
        informative = spec.informative,
        "generated synthetic dataset"
    );

    if let Some(dir) = write_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;
        crate::io::export::write_labeled_csv(&dir.join("train.csv"), &train, "target", &train_labels)?;
        crate::io::export::write_labeled_csv(&dir.join("test.csv"), &test, "target", &test_labels)?;
        info!(dir = %dir.display(), "wrote train.csv and test.csv");
    }

    evaluate_tables(&train, &train_labels, &test, test_labels, config, display)
}

fn evaluate_tables(
    train: &FeatureTable,
    train_labels: &[f64],
    test: &FeatureTable,
    test_labels: Vec<f64>,
    config: &EvaluateConfig,
    display: &ImportanceConfig,
) -> Result<EvaluateOutput, AppError> {
    let evaluation = crate::fit::evaluate(train, train_labels, test, &test_labels, config)?;
    let view = if evaluation.importances.iter().any(|r| r.importance > 0.0) {
        Some(plot_feature_importances(&evaluation.importances, display)?)
    } else {
        warn!("all feature importances are zero; skipping ranking and plots");
        None
    };
    Ok(EvaluateOutput {
        evaluation,
        test_labels,
        view,
    })
}

/// Rank importances and render the top-N table, bar chart and (with a
/// threshold) the cumulative curve.
///
/// SVG charts are written when `config.svg_dir` is set.
pub fn plot_feature_importances(
    rows: &[FeatureImportance],
    config: &ImportanceConfig,
) -> Result<ImportanceView, AppError> {
    if let Some(t) = config.threshold.filter(|t| !(0.0..=1.0).contains(t)) {
        return Err(AppError::new(2, format!("Threshold must be in [0, 1], got {t}.")));
    }

    // A zero threshold counts as unset.
    let threshold = config.threshold.filter(|&t| t > 0.0);

    let ranked = crate::report::rank_importances(rows)?;
    let required = threshold.and_then(|t| crate::report::features_for_threshold(&ranked, t));

    let mut rendered = crate::report::format_importance_table(&ranked, config.top_n);
    if config.plot {
        rendered.push('\n');
        rendered.push_str(&crate::plot::render_importance_bars(
            &ranked,
            config.top_n,
            config.plot_width,
        ));
        if threshold.is_some() {
            rendered.push('\n');
            rendered.push_str(&crate::plot::render_cumulative_plot(
                &ranked,
                required,
                config.plot_width,
                config.plot_height,
            ));
        }
    }
    if let Some(t) = threshold {
        rendered.push('\n');
        rendered.push_str(&crate::report::format_threshold_message(required, t));
        rendered.push('\n');
    }

    let mut svg_files = Vec::new();
    if let Some(dir) = &config.svg_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;
        svg_files.push(crate::plot::svg::write_importance_bars(dir, &ranked, config.top_n)?);
        if threshold.is_some() {
            svg_files.push(crate::plot::svg::write_cumulative(dir, &ranked, required)?);
        }
    }

    Ok(ImportanceView {
        ranked,
        required,
        rendered,
        svg_files,
    })
}

/// Reorder test columns to match the training header.
///
/// Both files must carry the same feature set.
fn align_columns(train: &LabeledTable, test: LabeledTable) -> Result<LabeledTable, AppError> {
    let train_names = train.table.names();
    let test_names = test.table.names();
    if train_names == test_names {
        return Ok(test);
    }

    let mut order = Vec::with_capacity(train_names.len());
    for name in train_names {
        let idx = test_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| AppError::new(2, format!("Test CSV is missing feature column '{name}'.")))?;
        order.push(idx);
    }
    if test_names.len() != train_names.len() {
        return Err(AppError::new(
            2,
            format!(
                "Test CSV has {} feature columns, training CSV has {}.",
                test_names.len(),
                train_names.len()
            ),
        ));
    }

    let values = test.table.values().select_columns(order.iter());
    let table = FeatureTable::new(train_names.to_vec(), values)?;
    Ok(LabeledTable { table, ..test })
}

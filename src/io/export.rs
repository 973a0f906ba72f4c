//! Export evaluation results.
//!
//! CSV files are meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON report is the portable summary of one run.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{EvaluateConfig, Evaluation, EvaluationReport, FeatureTable, RankedImportance};
use crate::error::AppError;

/// Write `row,label,prediction` for every test row.
pub fn write_predictions_csv(path: &Path, labels: &[f64], predictions: &[f64]) -> Result<(), AppError> {
    if labels.len() != predictions.len() {
        return Err(AppError::new(
            2,
            format!(
                "Label/prediction length mismatch: {} vs {}.",
                labels.len(),
                predictions.len()
            ),
        ));
    }

    let mut writer = create_writer(path)?;
    write_row(&mut writer, ["row", "label", "prediction"])?;
    for (i, (y, p)) in labels.iter().zip(predictions).enumerate() {
        write_row(
            &mut writer,
            [i.to_string(), format!("{y}"), format!("{p:.6}")],
        )?;
    }
    flush(writer)
}

/// Write the ranked importance table.
pub fn write_importances_csv(path: &Path, ranked: &[RankedImportance]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(
        &mut writer,
        ["feature", "importance", "importance_normalized", "cumulative_importance"],
    )?;
    for r in ranked {
        write_row(
            &mut writer,
            [
                r.feature.clone(),
                format!("{:.10}", r.importance),
                format!("{:.10}", r.importance_normalized),
                format!("{:.10}", r.cumulative_importance),
            ],
        )?;
    }
    flush(writer)
}

/// Write a feature table with its label column appended last.
///
/// Missing cells are written empty so the file reads back identically.
pub fn write_labeled_csv(
    path: &Path,
    table: &FeatureTable,
    label_column: &str,
    labels: &[f64],
) -> Result<(), AppError> {
    if labels.len() != table.nrows() {
        return Err(AppError::new(
            2,
            format!("Table has {} rows but {} labels.", table.nrows(), labels.len()),
        ));
    }

    let mut writer = create_writer(path)?;
    let header = table
        .names()
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(label_column));
    write_row(&mut writer, header)?;

    for (i, row) in table.values().row_iter().enumerate() {
        let cells = row
            .iter()
            .map(|v| if v.is_nan() { String::new() } else { format!("{v}") })
            .chain(std::iter::once(format!("{}", labels[i])));
        write_row(&mut writer, cells)?;
    }
    flush(writer)
}

/// Assemble the JSON report for a finished run.
pub fn build_report(
    eval: &Evaluation,
    config: &EvaluateConfig,
    ranked: &[RankedImportance],
) -> EvaluationReport {
    EvaluationReport {
        tool: "retail".to_string(),
        generated_at: Utc::now(),
        config: config.clone(),
        n_train: eval.n_train,
        n_test: eval.n_test,
        cv: eval.cv.clone(),
        test_mae: eval.test_mae,
        importances: ranked.to_vec(),
    }
}

/// Write the evaluation report as pretty JSON.
pub fn write_report_json(path: &Path, report: &EvaluationReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_row<I, T>(writer: &mut csv::Writer<File>, row: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))
}

fn flush(mut writer: csv::Writer<File>) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}

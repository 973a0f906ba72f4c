//! CSV ingest for feature tables and importance tables.
//!
//! Feature CSVs have a header row; one named column holds the label and every
//! other column becomes a numeric feature. Cell conventions:
//!
//! - empty, `nan`, `na`, `null` → missing (`NaN`)
//! - `inf`, `+inf`, `infinity` / `-inf`, `-infinity` → `±inf`
//! - anything else must parse as `f64`
//!
//! Rows with an unparseable cell or a missing label are skipped and reported
//! as `RowError`s instead of failing the whole load.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{FeatureImportance, FeatureTable};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Feature table plus its label column.
#[derive(Debug, Clone)]
pub struct LabeledTable {
    pub table: FeatureTable,
    pub labels: Vec<f64>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a feature CSV, splitting off `label_column`.
pub fn read_feature_csv(path: &Path, label_column: &str) -> Result<LabeledTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let loaded = read_feature_records(file, label_column)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {}", path.display(), e.message())))?;

    info!(
        path = %path.display(),
        rows_read = loaded.rows_read,
        rows = loaded.table.nrows(),
        features = loaded.table.ncols(),
        skipped = loaded.row_errors.len(),
        "loaded feature table"
    );
    for err in loaded.row_errors.iter().take(5) {
        warn!(path = %path.display(), line = err.line, "{}", err.message);
    }
    Ok(loaded)
}

/// Parse feature records from any reader (used directly by tests).
pub fn read_feature_records<R: std::io::Read>(
    reader: R,
    label_column: &str,
) -> Result<LabeledTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names = header_names(&headers)?;

    let label_idx = names
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| AppError::new(2, format!("Label column '{label_column}' not found.")))?;
    let feature_names: Vec<String> = names
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_record(&record, &names, label_idx) {
            Ok((label, row)) => {
                labels.push(label);
                rows.push(row);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No valid rows in feature table."));
    }

    let table = FeatureTable::from_rows(feature_names, &rows)?;
    Ok(LabeledTable {
        table,
        labels,
        row_errors,
        rows_read,
    })
}

/// Load a `feature,importance` CSV.
pub fn read_importance_csv(path: &Path) -> Result<Vec<FeatureImportance>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_importance_records(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {}", path.display(), e.message())))
}

pub fn read_importance_records<R: std::io::Read>(reader: R) -> Result<Vec<FeatureImportance>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names = header_names(&headers)?;
    let column = |name: &str| {
        names
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AppError::new(2, format!("Missing required column '{name}'.")))
    };
    let feature_idx = column("feature")?;
    let importance_idx = column("importance")?;

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("Line {line}: {e}")))?;
        let feature = record.get(feature_idx).unwrap_or("").to_string();
        let raw = record.get(importance_idx).unwrap_or("");
        let importance = raw
            .parse::<f64>()
            .map_err(|_| AppError::new(2, format!("Line {line}: invalid importance '{raw}'.")))?;
        out.push(FeatureImportance { feature, importance });
    }
    Ok(out)
}

fn header_names(headers: &StringRecord) -> Result<Vec<String>, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let mut seen = HashSet::new();
    for name in &names {
        if name.is_empty() {
            return Err(AppError::new(2, "CSV header contains an empty column name."));
        }
        if !seen.insert(name.as_str()) {
            return Err(AppError::new(2, format!("Duplicate column '{name}' in CSV header.")));
        }
    }
    Ok(names)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_record(
    record: &StringRecord,
    names: &[String],
    label_idx: usize,
) -> Result<(f64, Vec<f64>), String> {
    if record.len() != names.len() {
        return Err(format!(
            "Expected {} fields, found {}.",
            names.len(),
            record.len()
        ));
    }

    let mut label = f64::NAN;
    let mut row = Vec::with_capacity(names.len() - 1);
    for (i, cell) in record.iter().enumerate() {
        let value = parse_cell(cell).ok_or_else(|| format!("Column '{}': invalid number '{cell}'.", names[i]))?;
        if i == label_idx {
            label = value;
        } else {
            row.push(value);
        }
    }

    if !label.is_finite() {
        return Err(format!("Label '{}' is missing or not finite.", names[label_idx]));
    }
    Ok((label, row))
}

/// Parse one numeric cell; `None` when the text is not a number.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    match cell.to_ascii_lowercase().as_str() {
        "" | "nan" | "na" | "n/a" | "null" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => cell.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_column_is_split_off() {
        let csv = "\u{feff}sqft,price,age\n1000,200.5,10\n1500,300,\n";
        let loaded = read_feature_records(csv.as_bytes(), "price").unwrap();

        assert_eq!(loaded.table.names(), &["sqft".to_string(), "age".to_string()]);
        assert_eq!(loaded.labels, vec![200.5, 300.0]);
        assert_eq!(loaded.table.values()[(0, 1)], 10.0);
        assert!(loaded.table.values()[(1, 1)].is_nan());
        assert!(loaded.row_errors.is_empty());
        assert_eq!(loaded.rows_read, 2);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let csv = "a,y\n1,2\nabc,3\n4,\n5,6,7\n8,9\n";
        let loaded = read_feature_records(csv.as_bytes(), "y").unwrap();

        assert_eq!(loaded.labels, vec![2.0, 9.0]);
        let lines: Vec<usize> = loaded.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn infinities_and_missing_tokens_parse() {
        assert_eq!(parse_cell("inf"), Some(f64::INFINITY));
        assert_eq!(parse_cell("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse_cell("NA").unwrap().is_nan());
        assert!(parse_cell("").unwrap().is_nan());
        assert_eq!(parse_cell(" 2.5 "), Some(2.5));
        assert_eq!(parse_cell("x1"), None);
    }

    #[test]
    fn missing_label_column_is_an_input_error() {
        let err = read_feature_records("a,b\n1,2\n".as_bytes(), "price").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = read_feature_records("a,a,y\n1,2,3\n".as_bytes(), "y").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn importance_csv_round_trips_columns_by_name() {
        let csv = "importance,feature\n0.25,age\n0.75,sqft\n";
        let rows = read_importance_records(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].feature, "sqft");
        assert_eq!(rows[1].importance, 0.75);
    }

    #[test]
    fn importance_csv_requires_columns() {
        let err = read_importance_records("name,score\na,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

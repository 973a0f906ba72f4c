//! SVG charts rendered with Plotters.
//!
//! Two figures mirror the terminal plots:
//! - `feature_importances.svg`: horizontal bars of the top-N normalized
//!   importances, most important at the top
//! - `cumulative_importance.svg`: cumulative importance versus number of
//!   features, with a dashed red marker at the threshold feature count

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::domain::RankedImportance;
use crate::error::AppError;

pub const BARS_FILE: &str = "feature_importances.svg";
pub const CUMULATIVE_FILE: &str = "cumulative_importance.svg";

const BAR_COLOR: RGBColor = RGBColor(31, 64, 200);

type DrawResult = Result<(), Box<dyn Error>>;

/// Write the top-`n` bar chart into `dir`; returns the file path.
pub fn write_importance_bars(dir: &Path, ranked: &[RankedImportance], n: usize) -> Result<PathBuf, AppError> {
    let path = dir.join(BARS_FILE);
    let shown = &ranked[..n.min(ranked.len())];
    draw_bars(&path, shown)
        .map_err(|e| AppError::new(2, format!("Failed to render '{}': {e}", path.display())))?;
    Ok(path)
}

/// Write the cumulative importance chart into `dir`; returns the file path.
pub fn write_cumulative(
    dir: &Path,
    ranked: &[RankedImportance],
    required: Option<usize>,
) -> Result<PathBuf, AppError> {
    let path = dir.join(CUMULATIVE_FILE);
    draw_cumulative(&path, ranked, required)
        .map_err(|e| AppError::new(2, format!("Failed to render '{}': {e}", path.display())))?;
    Ok(path)
}

fn draw_bars(path: &Path, shown: &[RankedImportance]) -> DrawResult {
    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = shown.len();
    let x_max = shown
        .iter()
        .map(|r| r.importance_normalized)
        .fold(0.0, f64::max)
        .max(1e-9)
        * 1.1;
    // Bar i is centred on y = n - 1 - i so the first row is at the top.
    let y_range = -0.5..(n as f64 - 0.5).max(0.5);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(format!("Top {n} Most Important Features"), ("sans-serif", 18))
        .set_label_area_size(LabelAreaPosition::Left, 220)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, y_range)?;

    let label_for = |v: &f64| -> String {
        let idx = n as f64 - 1.0 - v;
        if (idx - idx.round()).abs() < 1e-6 && idx >= 0.0 && (idx.round() as usize) < n {
            shown[idx.round() as usize].feature.clone()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&label_for)
        .x_desc("Normalized Importance")
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(shown.iter().enumerate().map(|(i, r)| {
        let y = (n - 1 - i) as f64;
        Rectangle::new(
            [(0.0, y - 0.4), (r.importance_normalized, y + 0.4)],
            BAR_COLOR.filled(),
        )
    }))?;
    chart.draw_series(shown.iter().enumerate().map(|(i, r)| {
        let y = (n - 1 - i) as f64;
        Rectangle::new([(0.0, y - 0.4), (r.importance_normalized, y + 0.4)], BLACK)
    }))?;

    root.present()?;
    Ok(())
}

fn draw_cumulative(path: &Path, ranked: &[RankedImportance], required: Option<usize>) -> DrawResult {
    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = ranked.len().max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Cumulative Feature Importance", ("sans-serif", 18))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, 0.0..1.05)?;

    chart
        .configure_mesh()
        .x_desc("Number of Features")
        .y_desc("Cumulative Importance")
        .label_style(("sans-serif", 14))
        .draw()?;

    let curve = std::iter::once((0.0, 0.0)).chain(
        ranked
            .iter()
            .enumerate()
            .map(|(i, r)| ((i + 1) as f64, r.cumulative_importance)),
    );
    chart.draw_series(LineSeries::new(curve, &BLUE))?;

    if let Some(k) = required {
        let x = k as f64;
        chart.draw_series(DashedLineSeries::new(
            vec![(x, 0.0), (x, 1.05)],
            8,
            6,
            RED.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}

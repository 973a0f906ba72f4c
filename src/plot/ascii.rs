//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids with deterministic output (the tests pin exact
//! strings).
//!
//! Plot elements:
//! - importance bars: `#`, most important feature on the first row
//! - cumulative importance curve: `*` line
//! - threshold marker: `|` column at the number of features required

use crate::domain::RankedImportance;

/// Horizontal bar chart of the top `n` normalized importances.
///
/// Bars are scaled so the largest shown bar spans `width` characters.
pub fn render_importance_bars(ranked: &[RankedImportance], n: usize, width: usize) -> String {
    let width = width.max(10);
    let shown = &ranked[..n.min(ranked.len())];

    let mut out = String::new();
    out.push_str(&format!("Top {} Most Important Features\n", shown.len()));

    let label_width = shown
        .iter()
        .map(|r| r.feature.chars().count())
        .max()
        .unwrap_or(0)
        .min(28);
    let max_value = shown
        .iter()
        .map(|r| r.importance_normalized)
        .fold(0.0, f64::max);

    for r in shown {
        let len = if max_value > 0.0 {
            ((r.importance_normalized / max_value) * width as f64).round() as usize
        } else {
            0
        };
        let label: String = r.feature.chars().take(label_width).collect();
        out.push_str(&format!(
            "{label:<label_width$} |{:<width$} {:.4}\n",
            "#".repeat(len),
            r.importance_normalized,
        ));
    }
    out.push_str(&format!(
        "{:<label_width$}  Normalized Importance\n",
        ""
    ));

    out
}

/// Cumulative importance versus number of features.
///
/// The curve starts at `(0, 0)`; when `required` is given, a `|` column marks
/// that feature count.
pub fn render_cumulative_plot(
    ranked: &[RankedImportance],
    required: Option<usize>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let x_max = ranked.len().max(1) as f64;
    let (y_min, y_max) = (0.0, 1.05);

    let mut grid = vec![vec![' '; width]; height];

    if let Some(k) = required {
        let x = map_x(k as f64, 0.0, x_max, width);
        for row in grid.iter_mut() {
            row[x] = '|';
        }
    }

    let curve: Vec<(f64, f64)> = std::iter::once((0.0, 0.0))
        .chain(
            ranked
                .iter()
                .enumerate()
                .map(|(i, r)| ((i + 1) as f64, r.cumulative_importance)),
        )
        .collect();
    draw_curve(&mut grid, &curve, x_max, y_min, y_max);

    let mut out = String::new();
    out.push_str(&format!(
        "Cumulative Feature Importance: features=[0, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        ranked.len()
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, 0.0, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, '*'),
            None => grid[yy][x] = '*',
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Overwrites the threshold marker.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

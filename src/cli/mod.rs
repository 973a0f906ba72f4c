//! Command-line parsing for the random forest evaluator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ImputeAxis;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "retail",
    version,
    about = "Random forest regression evaluation and feature importance ranking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cross-validate and test a random forest on train/test CSVs.
    Evaluate(EvaluateArgs),
    /// Rank a `feature,importance` CSV and plot cumulative importance.
    Importances(ImportancesArgs),
    /// Generate a synthetic dataset and evaluate it end to end.
    Demo(DemoArgs),
}

/// Random forest options shared by `evaluate` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Number of trees in the forest.
    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    /// Random seed for bootstrap sampling (`demo` also seeds data generation with it).
    #[arg(long, default_value_t = 50)]
    pub seed: u64,

    /// Number of cross-validation folds.
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Median imputation statistics: per row (default) or per column (train medians).
    #[arg(long, value_enum, default_value_t = ImputeAxis::Row)]
    pub impute_axis: ImputeAxis,

    /// Maximum tree depth (unlimited when omitted).
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Features considered at each split (all when omitted).
    #[arg(long)]
    pub max_features: Option<usize>,
}

/// Importance display options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct DisplayArgs {
    /// Number of top features to show.
    #[arg(long, default_value_t = 15)]
    pub top: usize,

    /// Cumulative importance share to report the required feature count for.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Also write SVG charts into this directory.
    #[arg(long, value_name = "DIR")]
    pub svg_dir: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct EvaluateArgs {
    /// Training CSV (header row, label column included).
    #[arg(long, value_name = "CSV")]
    pub train: PathBuf,

    /// Test CSV with the same columns as the training CSV.
    #[arg(long, value_name = "CSV")]
    pub test: PathBuf,

    /// Name of the label column.
    #[arg(long, value_name = "COL")]
    pub label: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub display: DisplayArgs,

    /// Write test-set predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub predictions: Option<PathBuf>,

    /// Write the ranked importance table to CSV.
    #[arg(long, value_name = "CSV")]
    pub importances: Option<PathBuf>,

    /// Write a JSON run report.
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ImportancesArgs {
    /// CSV with `feature` and `importance` columns.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    #[command(flatten)]
    pub display: DisplayArgs,

    /// Write the ranked table (normalized + cumulative columns) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of generated rows (train + test).
    #[arg(long, default_value_t = 500)]
    pub rows: usize,

    /// Number of generated features.
    #[arg(long, default_value_t = 20)]
    pub features: usize,

    /// Features that actually drive the label.
    #[arg(long, default_value_t = 5)]
    pub informative: usize,

    /// Standard deviation of the label noise.
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    /// Share of feature cells blanked as missing.
    #[arg(long, default_value_t = 0.02)]
    pub missing_fraction: f64,

    /// Share of rows held out as the test set.
    #[arg(long, default_value_t = 0.25)]
    pub test_fraction: f64,

    /// Save the generated `train.csv` / `test.csv` here.
    #[arg(long, value_name = "DIR")]
    pub write_dir: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub display: DisplayArgs,
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs logging
//! - parses CLI arguments
//! - runs evaluation / ranking through `pipeline`
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, DemoArgs, DisplayArgs, EvaluateArgs, ImportancesArgs, ModelArgs};
use crate::data::SyntheticSpec;
use crate::domain::{EvaluateConfig, ForestParams, ImportanceConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `retail` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init()?;

    match cli.command {
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Importances(args) => handle_importances(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = evaluate_config_from_args(&args.model);
    let display = importance_config_from_args(&args.display);

    let run = pipeline::run_evaluate(&args.train, &args.test, &args.label, &config, &display)?;
    print_evaluation(&run, &config);

    // Optional exports.
    if let Some(path) = &args.predictions {
        crate::io::export::write_predictions_csv(path, &run.test_labels, &run.evaluation.predictions)?;
        info!(path = %path.display(), "wrote predictions");
    }
    let ranked = run.view.as_ref().map(|v| v.ranked.as_slice()).unwrap_or_default();
    if let Some(path) = &args.importances {
        if run.view.is_some() {
            crate::io::export::write_importances_csv(path, ranked)?;
            info!(path = %path.display(), "wrote importances");
        } else {
            warn!(path = %path.display(), "no ranked importances to write");
        }
    }
    if let Some(path) = &args.report {
        let report = crate::io::export::build_report(&run.evaluation, &config, ranked);
        crate::io::export::write_report_json(path, &report)?;
        info!(path = %path.display(), "wrote report");
    }

    Ok(())
}

fn handle_importances(args: ImportancesArgs) -> Result<(), AppError> {
    let mut display = importance_config_from_args(&args.display);
    display.export = args.export.clone();

    let rows = crate::io::ingest::read_importance_csv(&args.input)?;
    let view = pipeline::plot_feature_importances(&rows, &display)?;
    print!("{}", view.rendered);
    log_svg_files(&view.svg_files);

    if let Some(path) = &display.export {
        crate::io::export::write_importances_csv(path, &view.ranked)?;
        info!(path = %path.display(), "wrote ranked importances");
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = evaluate_config_from_args(&args.model);
    let display = importance_config_from_args(&args.display);
    let spec = SyntheticSpec {
        rows: args.rows,
        features: args.features,
        informative: args.informative,
        noise: args.noise,
        missing_fraction: args.missing_fraction,
        seed: args.model.seed,
    };

    let run = pipeline::run_demo(
        &spec,
        args.test_fraction,
        args.write_dir.as_deref(),
        &config,
        &display,
    )?;
    print_evaluation(&run, &config);
    Ok(())
}

fn print_evaluation(run: &pipeline::EvaluateOutput, config: &EvaluateConfig) {
    println!(
        "{}",
        crate::report::format_evaluation_summary(&run.evaluation, config)
    );
    if let Some(view) = &run.view {
        print!("{}", view.rendered);
        log_svg_files(&view.svg_files);
    }
}

fn log_svg_files(files: &[std::path::PathBuf]) {
    for path in files {
        info!(path = %path.display(), "wrote chart");
    }
}

pub fn evaluate_config_from_args(args: &ModelArgs) -> EvaluateConfig {
    EvaluateConfig {
        forest: ForestParams {
            n_trees: args.trees,
            seed: args.seed,
            max_features: args.max_features,
            max_depth: args.max_depth,
            ..ForestParams::default()
        },
        folds: args.folds,
        impute_axis: args.impute_axis,
    }
}

pub fn importance_config_from_args(args: &DisplayArgs) -> ImportanceConfig {
    ImportanceConfig {
        top_n: args.top,
        threshold: args.threshold,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg_dir: args.svg_dir.clone(),
        export: None,
    }
}

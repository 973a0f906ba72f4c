//! `retail-forest` library crate.
//!
//! Random forest regression evaluation (median imputation, K-fold cross
//! validation, median absolute error) and feature importance ranking with
//! cumulative-importance plots.
//!
//! The binary (`retail`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable from other tools

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forest;
pub mod impute;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;

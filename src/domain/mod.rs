//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the numeric feature table and its labels (`FeatureTable`)
//! - forest / evaluation configuration (`ForestParams`, `EvaluateConfig`)
//! - importance tables, raw and ranked (`FeatureImportance`, `RankedImportance`)
//! - evaluation outputs (`Evaluation`, `CvSummary`, `EvaluationReport`)

pub mod types;

pub use types::*;

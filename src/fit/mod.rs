//! Model evaluation.
//!
//! Responsibilities:
//!
//! - split a training set into K contiguous folds
//! - cross-validate a forest with median absolute error
//! - run the full `evaluate` workflow (impute, cross-validate, fit, predict, score)

pub mod cross_validation;
pub mod evaluate;

pub use cross_validation::*;
pub use evaluate::*;

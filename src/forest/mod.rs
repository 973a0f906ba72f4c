//! Tree-based regression models.
//!
//! - `tree`: a single CART regression tree with impurity importances
//! - `random_forest`: bootstrap forest of trees fitted in parallel

pub mod random_forest;
pub mod tree;

pub use random_forest::*;
pub use tree::*;

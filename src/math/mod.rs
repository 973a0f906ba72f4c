//! Small numeric helpers: order statistics and error metrics.

pub mod stats;

pub use stats::*;

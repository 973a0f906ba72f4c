//! Importance plots.
//!
//! - `ascii`: deterministic terminal rendering
//! - `svg`: file output via Plotters

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

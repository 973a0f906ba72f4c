//! Input/output helpers.
//!
//! - CSV ingest of feature and importance tables (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

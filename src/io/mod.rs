//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - model artifact JSON (`artifacts`)
//! - result exports (JSON/CSV) (`export`)

pub mod artifacts;
pub mod export;
pub mod ingest;

pub use artifacts::*;
pub use export::*;
pub use ingest::*;

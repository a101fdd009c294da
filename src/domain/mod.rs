//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parcel identifiers and floor-label parsing (`parcel`)
//! - reference-table rows and assessment results (`types`)
//! - typed, validated model artifacts (`artifacts`)

pub mod artifacts;
pub mod parcel;
pub mod types;

pub use artifacts::*;
pub use parcel::*;
pub use types::*;

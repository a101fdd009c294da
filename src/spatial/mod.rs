//! Spatial and structural feature engine.

pub mod features;

pub use features::*;

//! Risk grading and zone mapping.

pub mod zone;

pub use zone::*;

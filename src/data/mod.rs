//! Reference data loading and sharing.

pub mod store;

pub use store::*;

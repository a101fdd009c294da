//! Reporting: terminal formatting and plain-language commentary.

pub mod commentary;
pub mod format;

pub use commentary::*;
pub use format::*;

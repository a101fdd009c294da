//! `jeonse-risk` library crate.
//!
//! The binary (`jeonse`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline can be embedded by a presentation layer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod spatial;

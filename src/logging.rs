//! Logging setup for the `jeonse` binary.
//!
//! The library only emits `tracing` events; the binary installs a subscriber
//! here. Logs go to stderr so `--json` output on stdout stays clean.
//! `RUST_LOG`, when set, overrides the configured level.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Dependency crates whose debug output is not useful here.
pub const NOISY_MODULES: &[&str] = &["rayon", "rayon_core"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(log_level: &str, log_format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    match log_format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            let _ = subscriber.with(fmt_layer).try_init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .with_file(false)
                .with_line_number(false);
            let _ = subscriber.with(fmt_layer).try_init();
        }
    }

    tracing::debug!(log_level, ?log_format, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_formats() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging("warn", LogFormat::Pretty);
        init_logging("debug", LogFormat::Json);
    }
}

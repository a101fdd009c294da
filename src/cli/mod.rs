//! Command-line parsing for the lease risk scorer.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and the models.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "jeonse", version, about = "Jeonse (lease deposit) contract risk scorer")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand. Unset values fall back to `JEONSE_*`
/// environment variables, then defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Directory with the reference tables and model artifacts.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 10-digit district code used to build parcel keys.
    #[arg(long, global = true)]
    pub district: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run both tracks and print the zone verdict.
    Assess(AssessArgs),
    /// Structural (fraud-pattern) track only.
    Structural(LeaseArgs),
    /// Market (price-path) track only, for a given V0.
    Market(MarketArgs),
    /// Look up the zone for two probabilities.
    Zone(ZoneArgs),
    /// Assess every row of a CSV file in parallel.
    Batch(BatchArgs),
}

/// A lease contract as entered on the input form.
#[derive(Debug, Args, Clone)]
pub struct LeaseArgs {
    /// Lot number, e.g. `366-50`.
    #[arg(long)]
    pub lot: String,

    /// Exclusive floor area (㎡).
    #[arg(long)]
    pub area: f64,

    /// Floor number or label (`4`, `지상 4층`, `반지하`).
    #[arg(long, allow_hyphen_values = true)]
    pub floor: String,

    /// Deposit (10k KRW).
    #[arg(long)]
    pub deposit: f64,
}

#[derive(Debug, Args, Clone)]
pub struct AssessArgs {
    #[command(flatten)]
    pub lease: LeaseArgs,

    /// Contract term in years.
    #[arg(long, default_value_t = 2.0)]
    pub term: f64,

    /// Print the assessment as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Also write the assessment JSON to this path.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MarketArgs {
    /// Hedonic value V0 (10k KRW).
    #[arg(long)]
    pub v0: f64,

    /// Deposit (10k KRW).
    #[arg(long)]
    pub deposit: f64,

    /// Contract term in years.
    #[arg(long, default_value_t = 2.0)]
    pub term: f64,

    /// Monte-Carlo paths for a PD cross-check (0 = skip).
    #[arg(long, default_value_t = 0)]
    pub paths: usize,

    /// Seed for the Monte-Carlo cross-check.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Scenario to cross-check.
    #[arg(long, default_value = "base")]
    pub scenario: String,
}

#[derive(Debug, Args, Clone)]
pub struct ZoneArgs {
    /// Structural probability in [0, 1].
    #[arg(long)]
    pub structural: f64,

    /// Market PD in [0, 1].
    #[arg(long)]
    pub market: f64,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Input CSV (`lot,area_sqm,floor,deposit[,term_years]`).
    #[arg(long)]
    pub input: PathBuf,

    /// Output CSV.
    #[arg(long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assess_with_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "jeonse", "assess", "--lot", "366-50", "--area", "29.94", "--floor", "4", "--deposit", "27000",
            "--data-dir", "/tmp/ref", "--json",
        ]);
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/ref")));
        match cli.command {
            Command::Assess(a) => {
                assert_eq!(a.lease.lot, "366-50");
                assert_eq!(a.term, 2.0);
                assert!(a.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_market_cross_check() {
        let cli = Cli::parse_from(["jeonse", "market", "--v0", "45000", "--deposit", "27000", "--paths", "10000"]);
        match cli.command {
            Command::Market(m) => {
                assert_eq!(m.paths, 10_000);
                assert_eq!(m.seed, 42);
                assert_eq!(m.scenario, "base");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

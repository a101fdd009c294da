//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - initializes logging
//! - loads the reference data once and builds the pipeline
//! - dispatches the subcommand and prints/exports results

use std::sync::Arc;

use clap::Parser;

use crate::cli::{AssessArgs, BatchArgs, Cli, Command, GlobalArgs, LeaseArgs, MarketArgs, ZoneArgs};
use crate::config::{Overrides, Settings};
use crate::data::ReferenceStore;
use crate::domain::{AssessmentRequest, parse_floor_label};
use crate::error::AppError;
use crate::logging::init_logging;

pub mod pipeline;

use pipeline::{Pipeline, PipelineOptions};

/// Entry point for the `jeonse` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli.global)?;
    init_logging(&settings.log_level, settings.log_format);

    match cli.command {
        Command::Zone(args) => handle_zone(args, &settings),
        Command::Assess(args) => handle_assess(args, &build_pipeline(&settings)?),
        Command::Structural(args) => handle_structural(args, &build_pipeline(&settings)?),
        Command::Market(args) => handle_market(args, &build_pipeline(&settings)?),
        Command::Batch(args) => handle_batch(args, &build_pipeline(&settings)?),
    }
}

fn resolve_settings(global: &GlobalArgs) -> Result<Settings, AppError> {
    let settings = Settings::from_env()?.apply(Overrides {
        data_dir: global.data_dir.clone(),
        district_code: global.district.clone(),
        log_level: global.log_level.clone(),
        log_format: global.log_format,
    })?;
    Ok(settings)
}

fn build_pipeline(settings: &Settings) -> Result<Pipeline, AppError> {
    let store = ReferenceStore::new(&settings.data_dir);
    let data = store.load_once()?;
    Ok(Pipeline::new(
        Arc::clone(&data),
        PipelineOptions {
            district_code: settings.district_code.clone(),
            thresholds: settings.thresholds,
        },
    ))
}

fn request_from(lease: &LeaseArgs, term_years: f64) -> AssessmentRequest {
    AssessmentRequest {
        lot: lease.lot.clone(),
        area_sqm: lease.area,
        floor: parse_floor_label(&lease.floor),
        deposit: lease.deposit,
        term_years,
    }
}

fn handle_assess(args: AssessArgs, pipeline: &Pipeline) -> Result<(), AppError> {
    let request = request_from(&args.lease, args.term);
    let assessment = pipeline.assess(&request)?;

    if args.json {
        println!("{}", to_json(&assessment)?);
    } else {
        println!("{}", crate::report::format_assessment(&assessment));
    }

    if let Some(path) = &args.export {
        crate::io::write_assessment_json(path, &assessment)?;
        tracing::info!(path = %path.display(), "assessment exported");
    }
    Ok(())
}

fn handle_structural(args: LeaseArgs, pipeline: &Pipeline) -> Result<(), AppError> {
    let floor = parse_floor_label(&args.floor);
    let structural = pipeline.assess_structural_risk(&args.lot, args.area, floor, args.deposit)?;
    println!("{}", crate::report::format_structural(&structural));
    for line in crate::report::structural_comments(&structural.features, pipeline.data().total_suspected) {
        println!("- {line}");
    }
    Ok(())
}

fn handle_market(args: MarketArgs, pipeline: &Pipeline) -> Result<(), AppError> {
    let market = pipeline.assess_market_risk(args.v0, args.deposit, args.term)?;
    println!("{}", crate::report::format_market(&market));

    if args.paths > 0 {
        let check = pipeline.cross_check_pd(args.v0, args.deposit, args.term, &args.scenario, args.paths, args.seed)?;
        print!("{}", crate::report::format_simulation(&check));
        if check.z_score().abs() > 4.0 {
            tracing::warn!(z = check.z_score(), "Monte-Carlo PD disagrees with the closed form");
        }
    }
    Ok(())
}

fn handle_zone(args: ZoneArgs, settings: &Settings) -> Result<(), AppError> {
    let zone = crate::classify::checked_zone(args.structural, args.market, settings.thresholds)?;
    print!("{}", crate::report::format_zone(&zone));
    Ok(())
}

fn handle_batch(args: BatchArgs, pipeline: &Pipeline) -> Result<(), AppError> {
    let table = crate::io::read_requests(&args.input)?;
    let outcomes = pipeline.assess_batch(&table.rows);
    crate::io::write_batch_csv(&args.output, &outcomes)?;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    tracing::info!(
        rows = outcomes.len(),
        failed,
        skipped = table.row_errors.len(),
        output = %args.output.display(),
        "batch complete"
    );
    println!(
        "Assessed {} request(s): {} ok, {} failed, {} unreadable row(s) skipped.",
        outcomes.len(),
        outcomes.len() - failed,
        failed,
        table.row_errors.len()
    );
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::new(2, format!("Failed to serialize JSON: {e}")))
}

//! Floorplan document inspector
//!
//! Loads a document dump, reports records that could not be loaded, runs
//! every entity's verify hook, and optionally writes the document back out.
//!
//! Usage:
//!   floorplan-inspect plan.json --redump plan.clean.json
//!
//! Exits non-zero if the document did not load cleanly or failed to verify.

use anyhow::Result;
use clap::Parser;
use floorplan_cli::{InspectReport, inspect_file, redump};
use floorplan_model::io::{DumpOptions, LoadOptions};
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "floorplan-inspect")]
#[command(about = "Load, verify and re-dump a floorplan document")]
struct Args {
    /// Document dump to inspect
    path: PathBuf,

    /// Give loaded entities and state fields fresh ids
    #[arg(long)]
    remap_ids: bool,

    /// Write the loaded document to this path
    #[arg(long, value_name = "OUT")]
    redump: Option<PathBuf>,

    /// Write fields that still hold their defaults when re-dumping
    #[arg(long)]
    include_defaults: bool,

    /// Keep removed entities when re-dumping
    #[arg(long)]
    include_removed: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    debug!(?args, "floorplan-inspect starting");

    let options = LoadOptions {
        remap_ids: args.remap_ids,
    };
    let (doc, report) = inspect_file(&args.path, options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(out) = &args.redump {
        let dump = DumpOptions {
            include_defaults: args.include_defaults,
            include_removed: args.include_removed,
        };
        redump(&doc, out, dump)?;
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            issues = report.issues.len(),
            failures = report.failures.len(),
            "Document is not clean"
        );
        Ok(ExitCode::FAILURE)
    }
}

fn print_report(report: &InspectReport) {
    println!("\n========================================");
    println!("  {}", report.path.display());
    println!("========================================");
    println!("  Loaded:   {}", report.loaded);
    println!("  Live:     {}", report.live);
    println!("  Removed:  {}", report.removed);
    println!("  States:   {}", report.states);
    if !report.classes.is_empty() {
        println!("\n  Classes:");
        for (tag, count) in &report.classes {
            println!("    {tag:<12} {count}");
        }
    }
    if !report.issues.is_empty() {
        println!("\n  Load issues:");
        for issue in &report.issues {
            println!("    {issue}");
        }
    }
    if !report.failures.is_empty() {
        println!("\n  Verify failures:");
        for failure in &report.failures {
            println!("    {failure}");
        }
    }
    println!("========================================\n");
}

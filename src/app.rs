//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the selected pipeline stage
//! - prints reports
//! - writes the stage's output files

use std::fs::{self, File};
use std::path::Path;

use clap::Parser;

use crate::cli::{
    Cli, Command, MergeArgs, NormalityArgs, ParseArgs, PlotArgs, SheetArgs, SummaryArgs,
};
use crate::domain::ParseOptions;
use crate::error::AppError;
use crate::report::SummaryFile;

pub mod pipeline;

/// Entry point for the `tlab` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Parse(args) => handle_parse(args),
        Command::Sheet(args) => handle_sheet(args),
        Command::Plot(args) => handle_plot(args),
        Command::Summary(args) => handle_summary(args),
        Command::Normality(args) => handle_normality(args),
        Command::Merge(args) => handle_merge(args),
    }
}

fn handle_parse(args: ParseArgs) -> Result<(), AppError> {
    let config = pipeline::ParseConfig {
        raw_dir: args.raw_dir,
        options: ParseOptions {
            separator: args.separator,
            header_lines: args.header_lines,
        },
    };
    let output = pipeline::run_parse(&config)?;

    ensure_dir(&args.out)?;
    for probe in &output.probes {
        let path = args.out.join(format!("{}.json", probe.probe));
        crate::io::probe::write_probe_json(&path, probe)?;
    }

    print!(
        "{}",
        crate::report::format::format_parse_report(&output.files, &output.probes)
    );
    println!("Wrote {} probe JSON files to '{}'.", output.probes.len(), args.out.display());
    Ok(())
}

fn handle_sheet(args: SheetArgs) -> Result<(), AppError> {
    let probes = crate::io::probe::read_probe_dir(&args.json_dir)?;
    ensure_dir(&args.out)?;

    for probe in &probes {
        let path = args.out.join(format!("{}.xlsx", probe.probe));
        crate::io::xlsx::write_probe_workbook(&path, probe)?;
        println!("Wrote '{}'.", path.display());
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let probes = crate::io::probe::read_probe_dir(&args.json_dir)?;
    ensure_dir(&args.out)?;

    for probe in &probes {
        for experiment in &probe.experiments {
            let path = args.out.join(format!("{}.svg", experiment.name));
            crate::plot::write_experiment_plot(&path, &probe.probe, experiment)?;
            println!("Wrote '{}'.", path.display());
        }
        if probe.experiments.len() > 1 {
            let path = args.out.join(format!("{}_overlay.svg", probe.probe));
            crate::plot::write_overlay_plot(&path, probe)?;
            println!("Wrote '{}'.", path.display());
        }
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let probes = crate::io::probe::read_probe_dir(&args.json_dir)?;
    let summary = crate::report::summarize(&probes);

    let file = File::create(&args.out).map_err(|e| {
        AppError::input(format!("Failed to create summary JSON '{}': {e}", args.out.display()))
    })?;
    serde_json::to_writer_pretty(file, &summary).map_err(|e| {
        AppError::input(format!("Failed to write summary JSON '{}': {e}", args.out.display()))
    })?;

    print!("{}", crate::report::format::format_summary_report(&summary));
    println!("\nWrote '{}'.", args.out.display());
    Ok(())
}

fn handle_normality(args: NormalityArgs) -> Result<(), AppError> {
    let file = File::open(&args.summary).map_err(|e| {
        AppError::input(format!("Failed to open summary JSON '{}': {e}", args.summary.display()))
    })?;
    let summary: SummaryFile = serde_json::from_reader(file).map_err(|e| {
        AppError::input(format!("Invalid summary JSON '{}': {e}", args.summary.display()))
    })?;

    let rows = crate::report::normality::normality_rows(&summary)?;
    crate::io::xlsx::write_normality_workbook(&args.out, &rows)?;

    print!("{}", crate::report::format::format_normality_report(&rows));
    println!("\nWrote '{}'.", args.out.display());
    Ok(())
}

fn handle_merge(args: MergeArgs) -> Result<(), AppError> {
    crate::io::xlsx::merge_workbooks(&args.inputs, &args.out)?;
    println!("Merged {} workbooks into '{}'.", args.inputs.len(), args.out.display());
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::input(format!("Failed to create output directory '{}': {e}", dir.display()))
    })
}

//! Command-line parsing for the tensile-test lab pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the parsing/metric code. Each subcommand is one
//! pipeline stage; chaining stages is a shell concern.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tlab", version, about = "Tensile-test lab ETL and reporting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one pipeline stage each.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a directory of raw instrument exports into per-probe JSON files.
    Parse(ParseArgs),
    /// Emit per-probe spreadsheets from probe JSON files.
    Sheet(SheetArgs),
    /// Render stress-strain SVG plots from probe JSON files.
    Plot(PlotArgs),
    /// Aggregate probe JSON files into a summary JSON.
    Summary(SummaryArgs),
    /// Run the Shapiro-Wilk normality test over a summary JSON.
    Normality(NormalityArgs),
    /// Merge several spreadsheets into one workbook.
    Merge(MergeArgs),
}

#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Directory with the machine's raw export files.
    pub raw_dir: PathBuf,

    /// Output directory for the per-probe JSON files.
    #[arg(long, default_value = "probes")]
    pub out: PathBuf,

    /// Raw data field separator.
    #[arg(long, default_value_t = ';')]
    pub separator: char,

    /// Number of metadata header lines before the column-name row.
    #[arg(long = "header-lines", default_value_t = 40)]
    pub header_lines: usize,
}

#[derive(Debug, Parser)]
pub struct SheetArgs {
    /// Directory with probe JSON files produced by `tlab parse`.
    pub json_dir: PathBuf,

    /// Output directory for the workbooks.
    #[arg(long, default_value = "sheets")]
    pub out: PathBuf,
}

#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Directory with probe JSON files produced by `tlab parse`.
    pub json_dir: PathBuf,

    /// Output directory for the SVG files.
    #[arg(long, default_value = "plots")]
    pub out: PathBuf,
}

#[derive(Debug, Parser)]
pub struct SummaryArgs {
    /// Directory with probe JSON files produced by `tlab parse`.
    pub json_dir: PathBuf,

    /// Output path for the summary JSON.
    #[arg(long, default_value = "summary.json")]
    pub out: PathBuf,
}

#[derive(Debug, Parser)]
pub struct NormalityArgs {
    /// Summary JSON produced by `tlab summary`.
    pub summary: PathBuf,

    /// Output path for the normality workbook.
    #[arg(long, default_value = "normality.xlsx")]
    pub out: PathBuf,
}

#[derive(Debug, Parser)]
pub struct MergeArgs {
    /// Workbooks to merge, in sheet order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output path for the merged workbook.
    #[arg(long)]
    pub out: PathBuf,
}

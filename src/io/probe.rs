//! Read/write probe JSON files.
//!
//! Probe JSON is the "portable" representation of a parsed specimen:
//! - the probe root name and all its runs
//! - per-run metadata, channels, and derived metrics
//!
//! The schema is defined by `domain::ProbeFile`. Spreadsheets, plots, and
//! summaries are all produced from these files, never from the raw exports
//! directly.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::ProbeFile;
use crate::error::AppError;

/// `tool` field stamped into every JSON file we write.
pub const TOOL_NAME: &str = "tlab";

/// Write a probe JSON file.
pub fn write_probe_json(path: &Path, probe: &ProbeFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create probe JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, probe)
        .map_err(|e| AppError::input(format!("Failed to write probe JSON '{}': {e}", path.display())))?;

    Ok(())
}

/// Read a probe JSON file.
pub fn read_probe_json(path: &Path) -> Result<ProbeFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open probe JSON '{}': {e}", path.display())))?;
    let probe: ProbeFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid probe JSON '{}': {e}", path.display())))?;
    Ok(probe)
}

/// Read every `*.json` probe file in a directory, sorted by file name.
pub fn read_probe_dir(dir: &Path) -> Result<Vec<ProbeFile>, AppError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::input(format!("Failed to read probe directory '{}': {e}", dir.display())))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(AppError::no_data(format!(
            "No probe JSON files found in '{}'.",
            dir.display()
        )));
    }

    paths.iter().map(|p| read_probe_json(p)).collect()
}

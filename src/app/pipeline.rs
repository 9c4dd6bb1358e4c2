//! The parse workflow: raw directory -> probes with derived metrics.
//!
//! Keeping this out of `app.rs` keeps the core workflow testable:
//! list files -> parse each export -> compute metrics -> group by probe
//!
//! `app` then focuses on presentation and writing the JSON files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{Experiment, ParseOptions, ProbeFile};
use crate::error::AppError;
use crate::io::probe::TOOL_NAME;
use crate::io::raw::{parse_experiment_date, parse_raw_file};
use crate::metrics::compute_metrics;
use crate::report::ParsedFile;

/// Configuration of a `tlab parse` run.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub raw_dir: PathBuf,
    pub options: ParseOptions,
}

/// All computed outputs of a parse run.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// Probes in name order, experiments in run order.
    pub probes: Vec<ProbeFile>,
    /// Per-file diagnostics, in processing order.
    pub files: Vec<ParsedFile>,
}

/// Execute the parse workflow over every raw export in the directory.
pub fn run_parse(config: &ParseConfig) -> Result<ParseOutput, AppError> {
    let paths = list_raw_files(&config.raw_dir)?;

    let mut probes: BTreeMap<String, ProbeFile> = BTreeMap::new();
    let mut files = Vec::new();

    for path in &paths {
        let raw = parse_raw_file(path, &config.options)?;
        let metrics = compute_metrics(&raw.metadata, &raw.channels)?;

        let source = file_name(path);
        let stem = file_stem(path);
        let (root, run_index) = split_probe_name(&stem);

        let probe = probes.entry(root.clone()).or_insert_with(|| ProbeFile {
            tool: TOOL_NAME.to_string(),
            probe: root.clone(),
            experiments: Vec::new(),
        });
        let index = run_index.unwrap_or(probe.experiments.len() + 1);

        probe.experiments.push(Experiment {
            name: stem,
            source: source.clone(),
            index,
            date: parse_experiment_date(&raw.metadata),
            metadata: raw.metadata,
            channels: raw.channels,
            metrics,
        });

        files.push(ParsedFile {
            source,
            probe: root,
            samples_used: raw.samples_used,
            row_errors: raw.row_errors,
        });
    }

    let mut probes: Vec<ProbeFile> = probes.into_values().collect();
    for probe in &mut probes {
        probe.experiments.sort_by_key(|e| e.index);
    }

    Ok(ParseOutput { probes, files })
}

/// Regular, non-hidden files in the raw directory, sorted by name.
fn list_raw_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::input(format!("Failed to read raw directory '{}': {e}", dir.display()))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| !file_name(p).starts_with('.'))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(AppError::no_data(format!(
            "No raw export files found in '{}'.",
            dir.display()
        )));
    }
    Ok(paths)
}

/// Split a file stem into probe root and run index.
///
/// The lab names exports `<probe>_<run>`; a stem without a numeric `_<run>`
/// suffix is a single-run probe.
///
/// `PA3_2` -> `("PA3", Some(2))`, `PA3` -> `("PA3", None)`.
pub fn split_probe_name(stem: &str) -> (String, Option<usize>) {
    if let Some((root, suffix)) = stem.rsplit_once('_') {
        if !root.is_empty() && !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = suffix.parse::<usize>() {
                return (root.to_string(), Some(index));
            }
        }
    }
    (stem.to_string(), None)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CHANNEL_ELONGATION, CHANNEL_TENSION};

    #[test]
    fn split_probe_name_cases() {
        assert_eq!(split_probe_name("PA3_2"), ("PA3".to_string(), Some(2)));
        assert_eq!(split_probe_name("PA3"), ("PA3".to_string(), None));
        assert_eq!(split_probe_name("PA_3_12"), ("PA_3".to_string(), Some(12)));
        assert_eq!(split_probe_name("PA3_x"), ("PA3_x".to_string(), None));
        assert_eq!(split_probe_name("_7"), ("_7".to_string(), None));
    }

    fn raw_export(final_length: &str) -> String {
        format!(
            "\"Probeta:\";\"1\"\n\
             \"Longitud final:\";{final_length};mm\n\
             \"Fecha ensayo:\";\"14/03/2023\"\n\
             \"Tiempo sec\";\"Extensi\u{fffd}n mm\";\"Carga N\"\n\
             0,0;0,00;0,0\n\
             0,1;0,06;40,0\n\
             0,2;0,12;80,0\n\
             0,3;0,18;120,0\n"
        )
    }

    #[test]
    fn run_parse_groups_runs_by_probe_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PA3_2.txt"), raw_export("65,0")).unwrap();
        std::fs::write(dir.path().join("PA3_1.txt"), raw_export("64,0")).unwrap();
        std::fs::write(dir.path().join("PB1.txt"), raw_export("66,0")).unwrap();

        let config = ParseConfig {
            raw_dir: dir.path().to_path_buf(),
            options: ParseOptions {
                separator: ';',
                header_lines: 3,
            },
        };
        let output = run_parse(&config).unwrap();

        assert_eq!(output.probes.len(), 2);
        assert_eq!(output.files.len(), 3);

        let pa3 = &output.probes[0];
        assert_eq!(pa3.probe, "PA3");
        assert_eq!(pa3.experiments.len(), 2);
        assert_eq!(pa3.experiments[0].index, 1);
        assert_eq!(pa3.experiments[1].index, 2);
        assert_eq!(
            pa3.experiments[0].date,
            chrono::NaiveDate::from_ymd_opt(2023, 3, 14)
        );

        // Derived metrics flow through: tension = load/40, ductility from
        // the header's finalLength.
        let metrics = &pa3.experiments[1].metrics;
        assert!((metrics.max_tension_mpa - 3.0).abs() < 1e-12);
        assert!((metrics.ductility.unwrap() - 5.0 / 60.0).abs() < 1e-12);

        let pb1 = &output.probes[1];
        assert_eq!(pb1.probe, "PB1");
        assert_eq!(pb1.experiments[0].index, 1);

        // Channels present, equal length, derived ones included.
        let exp = &pb1.experiments[0];
        assert_eq!(exp.channel(CHANNEL_TENSION).unwrap().len(), 4);
        assert_eq!(exp.channel(CHANNEL_ELONGATION).unwrap().len(), 4);
    }

    #[test]
    fn empty_raw_dir_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = ParseConfig {
            raw_dir: dir.path().to_path_buf(),
            options: ParseOptions::default(),
        };
        assert_eq!(run_parse(&config).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn missing_raw_dir_is_an_input_error() {
        let config = ParseConfig {
            raw_dir: PathBuf::from("/definitely/not/here"),
            options: ParseOptions::default(),
        };
        assert_eq!(run_parse(&config).unwrap_err().exit_code(), 2);
    }
}

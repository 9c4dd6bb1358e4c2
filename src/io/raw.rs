//! Raw instrument export parsing.
//!
//! One export is a semicolon-delimited text file with a fixed-format metadata
//! header followed by tabular time-series samples. This module turns it into
//! a clean metadata map plus equal-length numeric channels.
//!
//! Design goals:
//! - **Strict structure** for the header (unexpected cardinality is fatal)
//! - **Row-level tolerance** for samples (skip bad rows, report what happened)
//! - **Deterministic behavior** (no locale lookups; decimal commas handled
//!   explicitly)
//! - **Separation of concerns**: no metric computation here

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{
    CHANNEL_ELONGATION, CHANNEL_TENSION, CROSS_SECTION_MM2, FieldValue, GAUGE_LENGTH_MM,
    ParseOptions, UNKNOWN_FIELD_KEY, canonical_key,
};
use crate::error::AppError;

/// A line-level problem encountered in the tabular section.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based line number in the export.
    pub line: usize,
    pub message: String,
}

/// Parse output: metadata + channels + diagnostics.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Canonical key → header value.
    pub metadata: BTreeMap<String, FieldValue>,
    /// Canonical channel name → samples. All channels have equal length.
    pub channels: BTreeMap<String, Vec<f64>>,
    /// Column order as found in the export (canonical names).
    pub columns: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub samples_read: usize,
    pub samples_used: usize,
}

/// Parse one raw export from disk.
pub fn parse_raw_file(path: &Path, opts: &ParseOptions) -> Result<RawFile, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::input(format!("Failed to read raw file '{}': {e}", path.display())))?;

    // The machine writes Latin-1; decode lossily so accented header names
    // arrive as U+FFFD, which is exactly how the vocabulary table spells them.
    let text = String::from_utf8_lossy(&bytes);

    parse_raw_text(&text, opts)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse one raw export from already-decoded text.
pub fn parse_raw_text(text: &str, opts: &ParseOptions) -> Result<RawFile, AppError> {
    let mut metadata = BTreeMap::new();
    let mut channels: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut columns: Vec<String> = Vec::new();
    let mut row_errors = Vec::new();
    let mut samples_read = 0usize;
    let mut samples_used = 0usize;

    // Index of the derived channels' inputs within `columns`, resolved at the
    // column-name row.
    let mut load_idx: Option<usize> = None;
    let mut extension_idx: Option<usize> = None;
    let mut derive = false;

    let mut saw_column_row = false;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let fields: Vec<&str> = raw_line.split(opts.separator).collect();

        if idx < opts.header_lines {
            parse_header_line(&mut metadata, &mut row_errors, line, &fields)?;
        } else if idx == opts.header_lines {
            saw_column_row = true;
            columns = column_names(&fields);
            for name in &columns {
                channels.insert(name.clone(), Vec::new());
            }

            load_idx = columns.iter().position(|c| c == "loadN");
            extension_idx = columns.iter().position(|c| c == "extensionMM");
            derive = load_idx.is_some() && extension_idx.is_some();
            if derive {
                channels.insert(CHANNEL_TENSION.to_string(), Vec::new());
                channels.insert(CHANNEL_ELONGATION.to_string(), Vec::new());
            }
        } else {
            if raw_line.trim().is_empty() {
                continue;
            }
            samples_read += 1;

            if fields.len() != columns.len() {
                row_errors.push(RowError {
                    line,
                    message: format!(
                        "Expected {} sample fields, got {}.",
                        columns.len(),
                        fields.len()
                    ),
                });
                continue;
            }

            // Parse the whole row before appending anything so channels stay
            // equal length when a single field is garbage.
            let mut values = Vec::with_capacity(fields.len());
            let mut bad: Option<String> = None;
            for (col, field) in columns.iter().zip(&fields) {
                match parse_sample_value(field) {
                    Some(v) => values.push(v),
                    None => {
                        bad = Some(format!("Invalid numeric value '{field}' in column `{col}`."));
                        break;
                    }
                }
            }
            if let Some(message) = bad {
                row_errors.push(RowError { line, message });
                continue;
            }

            for (col, v) in columns.iter().zip(&values) {
                if let Some(channel) = channels.get_mut(col) {
                    channel.push(*v);
                }
            }
            if derive {
                let load = values[load_idx.unwrap_or(0)];
                let extension = values[extension_idx.unwrap_or(0)];
                push_channel(&mut channels, CHANNEL_TENSION, load / CROSS_SECTION_MM2);
                push_channel(&mut channels, CHANNEL_ELONGATION, extension / GAUGE_LENGTH_MM);
            }
            samples_used += 1;
        }
    }

    if !saw_column_row {
        return Err(AppError::no_data(format!(
            "No tabular section: file ends before header line {}.",
            opts.header_lines + 1
        )));
    }

    Ok(RawFile {
        metadata,
        channels,
        columns,
        row_errors,
        samples_read,
        samples_used,
    })
}

fn push_channel(channels: &mut BTreeMap<String, Vec<f64>>, name: &str, value: f64) {
    if let Some(channel) = channels.get_mut(name) {
        channel.push(value);
    }
}

/// Classify one header line by field count.
///
/// - 1 field: malformed machine line, ignored
/// - 2 fields: `[name, value]`, untyped
/// - 3 fields: `[name, value, unit]`, numeric
/// - anything else: fatal
fn parse_header_line(
    metadata: &mut BTreeMap<String, FieldValue>,
    row_errors: &mut Vec<RowError>,
    line: usize,
    fields: &[&str],
) -> Result<(), AppError> {
    match fields {
        [_single] => Ok(()),
        [name, value] => {
            metadata.insert(map_key(name), FieldValue::text(unquote(value)));
            Ok(())
        }
        [name, value, unit] => {
            let key = map_key(name);
            match parse_sample_value(unquote(value)) {
                Some(v) => {
                    metadata.insert(key, FieldValue::number(v, unquote(unit)));
                }
                None => {
                    row_errors.push(RowError {
                        line,
                        message: format!("Header field `{key}` has non-numeric value '{value}'."),
                    });
                    metadata.insert(key, FieldValue::text(unquote(value)));
                }
            }
            Ok(())
        }
        _ => Err(AppError::fatal(format!(
            "Expected 1, 2 or 3 header fields and got {} on line {line}: {fields:?}",
            fields.len()
        ))),
    }
}

/// Map the column-name row through the vocabulary, de-duplicating so every
/// channel gets its own sequence even when the firmware repeats a name.
fn column_names(fields: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        let base = map_key(field);
        let mut name = base.clone();
        let mut k = 2;
        while out.contains(&name) {
            name = format!("{base}{k}");
            k += 1;
        }
        out.push(name);
    }
    out
}

fn map_key(raw: &str) -> String {
    let name = unquote(raw);
    canonical_key(name)
        .unwrap_or(UNKNOWN_FIELD_KEY)
        .to_string()
}

/// Strip the machine's quoting: one trailing `"`, then a trailing `:`, then a
/// leading `"`. The order matches what the firmware actually emits
/// (`"Nombre:"` → `Nombre`).
fn unquote(raw: &str) -> &str {
    let raw = raw.strip_suffix('"').unwrap_or(raw);
    let raw = raw.strip_suffix(':').unwrap_or(raw);
    raw.strip_prefix('"').unwrap_or(raw)
}

/// Coerce locale-formatted decimal text (`1.234,56` never appears; plain
/// decimal commas do) to a finite `f64`.
fn parse_sample_value(s: &str) -> Option<f64> {
    let v = s.trim().replace(',', ".").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Parse the `experimentDate` header field, when present.
///
/// The machine prints `DD/MM/YYYY`; older firmware used dashes, and files
/// touched by spreadsheet tools sometimes come back ISO-formatted.
pub fn parse_experiment_date(metadata: &BTreeMap<String, FieldValue>) -> Option<NaiveDate> {
    let raw = match &metadata.get("experimentDate")?.value {
        crate::domain::FieldScalar::Text(s) => s.clone(),
        crate::domain::FieldScalar::Number(_) => return None,
    };

    const FMTS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d/%m/%y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(raw.trim(), fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(header_lines: usize) -> ParseOptions {
        ParseOptions {
            separator: ';',
            header_lines,
        }
    }

    const SAMPLE: &str = "\
\"Probeta:\";\"1\"
\"Fecha ensayo:\";\"14/03/2023\"
\"Longitud final:\";65,0;mm
garbage-machine-line
\"Temperatura:\";21.5;\u{b0}C
\"Tiempo sec\";\"Extensi\u{fffd}n mm\";\"Carga N\"
0,0;0,00;0,0
0,1;0,06;40,0
0,2;0,12;80,0
";

    #[test]
    fn header_fields_classify_by_cardinality() {
        let raw = parse_raw_text(SAMPLE, &opts(5)).unwrap();

        // 2 fields → untyped, unit "none".
        let probe = &raw.metadata["probe"];
        assert_eq!(probe.unit, "none");
        assert_eq!(probe.value, crate::domain::FieldScalar::Text("1".to_string()));

        // 3 fields → numeric with unit, decimal comma accepted.
        let final_length = &raw.metadata["finalLength"];
        assert_eq!(final_length.unit, "mm");
        assert_eq!(final_length.as_f64(), Some(65.0));
        assert_eq!(raw.metadata["temperature"].as_f64(), Some(21.5));
    }

    #[test]
    fn malformed_single_field_header_lines_are_ignored() {
        let raw = parse_raw_text(SAMPLE, &opts(5)).unwrap();
        assert!(!raw.metadata.values().any(|v| match &v.value {
            crate::domain::FieldScalar::Text(s) => s.contains("garbage"),
            crate::domain::FieldScalar::Number(_) => false,
        }));
    }

    #[test]
    fn four_field_header_line_is_fatal() {
        let text = "a;b;c;d\ncols\n";
        let err = parse_raw_text(text, &opts(1)).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn unknown_header_names_fail_closed_to_sentinel() {
        let text = "\"Velocidad:\";\"5\"\n\"Tiempo sec\";\"Carga N\"\n1,0;2,0\n";
        let raw = parse_raw_text(text, &opts(1)).unwrap();
        assert!(raw.metadata.contains_key(UNKNOWN_FIELD_KEY));
    }

    #[test]
    fn derived_channels_use_fixed_geometry() {
        let raw = parse_raw_text(SAMPLE, &opts(5)).unwrap();

        let load = raw.channel_slice("loadN");
        let extension = raw.channel_slice("extensionMM");
        let tension = raw.channel_slice(CHANNEL_TENSION);
        let elongation = raw.channel_slice(CHANNEL_ELONGATION);

        assert_eq!(load, &[0.0, 40.0, 80.0]);
        for i in 0..load.len() {
            assert_eq!(tension[i], load[i] / 40.0);
            assert_eq!(elongation[i], extension[i] / 60.0);
        }
    }

    #[test]
    fn bad_sample_rows_are_skipped_atomically() {
        let text = "\
\"Tiempo sec\";\"Extensi\u{fffd}n mm\";\"Carga N\"
0,0;0,00;0,0
0,1;oops;40,0
0,2;0,12
0,3;0,18;120,0
";
        let raw = parse_raw_text(text, &opts(0)).unwrap();
        assert_eq!(raw.samples_read, 4);
        assert_eq!(raw.samples_used, 2);
        assert_eq!(raw.row_errors.len(), 2);

        // Every channel, derived ones included, stays equal length.
        let lens: Vec<usize> = raw.channels.values().map(Vec::len).collect();
        assert!(lens.iter().all(|&l| l == 2), "lengths {lens:?}");
    }

    #[test]
    fn missing_tabular_section_is_no_data() {
        let err = parse_raw_text("\"Probeta:\";\"1\"\n", &opts(5)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn experiment_date_parses_machine_format() {
        let raw = parse_raw_text(SAMPLE, &opts(5)).unwrap();
        let date = parse_experiment_date(&raw.metadata).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 3, 14).unwrap());
    }

    impl RawFile {
        fn channel_slice(&self, name: &str) -> &[f64] {
            self.channels.get(name).map(Vec::as_slice).unwrap_or(&[])
        }
    }
}

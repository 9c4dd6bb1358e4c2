//! Spreadsheet emission and merging.
//!
//! The lab consumes three kinds of workbooks:
//! - per-probe workbooks: one sheet per run, headline block above the samples
//! - the normality workbook produced from a summary JSON
//! - merged workbooks combining several of the above (values only; styling
//!   is not carried over)

use std::collections::HashSet;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::domain::{CHANNEL_ELONGATION, CHANNEL_TENSION, Experiment, ProbeFile};
use crate::error::AppError;
use crate::report::normality::{ALPHA, NormalityRow};

/// Columns of the per-run data table, in sheet order.
///
/// Labels are what the lab's acceptance templates expect.
const TABLE_COLUMNS: [(&str, &str); 4] = [
    (CHANNEL_TENSION, "Tensi\u{f3}n [MPa]"),
    (CHANNEL_ELONGATION, "Elongaci\u{f3}n [-]"),
    ("extensionMM", "Extensi\u{f3}n [mm]"),
    ("loadN", "Carga [N]"),
];

/// First row (0-based) of the data table; the headline block sits above it.
const TABLE_START_ROW: u32 = 7;

/// Write one workbook for a probe, one sheet per experiment.
pub fn write_probe_workbook(path: &Path, probe: &ProbeFile) -> Result<(), AppError> {
    let mut workbook = Workbook::new();

    let mut used = HashSet::new();
    for experiment in &probe.experiments {
        let sheet = workbook.add_worksheet();
        let name = unique_sheet_name(&experiment.name, &mut used);
        sheet
            .set_name(&name)
            .map_err(|e| xlsx_error(path, e))?;
        write_experiment_sheet(sheet, experiment).map_err(|e| xlsx_error(path, e))?;
    }

    workbook.save(path).map_err(|e| xlsx_error(path, e))?;
    Ok(())
}

fn write_experiment_sheet(
    sheet: &mut Worksheet,
    experiment: &Experiment,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let bold = Format::new().set_bold();
    let metrics = &experiment.metrics;

    sheet.write_string_with_format(0, 0, "M\u{e1}ximos:", &bold)?;
    sheet.write_string(1, 0, "Tensi\u{f3}n m\u{e1}xima [MPa]:")?;
    sheet.write_number(1, 1, metrics.max_tension_mpa)?;
    sheet.write_string(2, 0, "Elongaci\u{f3}n m\u{e1}xima [-]:")?;
    sheet.write_number(2, 1, metrics.max_elongation)?;
    sheet.write_string(3, 0, "Ductilidad [%]:")?;
    match metrics.ductility {
        Some(d) => sheet.write_number(3, 1, d)?,
        None => sheet.write_string(3, 1, "n/a")?,
    };
    sheet.write_string(4, 0, "M\u{f3}dulo de Young [MPa]:")?;
    sheet.write_string(5, 0, "R\u{b2} ajuste:")?;
    match &metrics.modulus {
        Some(m) => {
            sheet.write_number(4, 1, m.slope_mpa)?;
            sheet.write_number(5, 1, m.r_squared)?;
        }
        None => {
            sheet.write_string(4, 1, "n/a")?;
            sheet.write_string(5, 1, "n/a")?;
        }
    }

    for (col, (_, label)) in TABLE_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(TABLE_START_ROW, col as u16, *label, &bold)?;
    }

    for (col, (channel, _)) in TABLE_COLUMNS.iter().enumerate() {
        let values = experiment.channel(channel).unwrap_or(&[]);
        for (row, v) in values.iter().enumerate() {
            sheet.write_number(TABLE_START_ROW + 1 + row as u32, col as u16, *v)?;
        }
    }

    Ok(())
}

/// Write the normality-test workbook.
pub fn write_normality_workbook(path: &Path, rows: &[NormalityRow]) -> Result<(), AppError> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Normalidad").map_err(|e| xlsx_error(path, e))?;
    write_normality_sheet(sheet, rows).map_err(|e| xlsx_error(path, e))?;

    workbook.save(path).map_err(|e| xlsx_error(path, e))?;
    Ok(())
}

fn write_normality_sheet(
    sheet: &mut Worksheet,
    rows: &[NormalityRow],
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let bold = Format::new().set_bold();

    let verdict_label = format!("Normal (\u{3b1}={ALPHA})");
    let header: [&str; 6] = ["M\u{e9}trica", "n", "W", "p", &verdict_label, "Nota"];
    for (col, label) in header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *label, &bold)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, row.metric)?;
        sheet.write_number(r, 1, row.n as f64)?;
        match row.test {
            Some(test) => {
                sheet.write_number(r, 2, test.w)?;
                sheet.write_number(r, 3, test.p_value)?;
                let verdict = if test.p_value >= ALPHA { "s\u{ed}" } else { "no" };
                sheet.write_string(r, 4, verdict)?;
            }
            None => {
                sheet.write_string(r, 4, "-")?;
            }
        }
        if let Some(note) = &row.note {
            sheet.write_string(r, 5, note)?;
        }
    }

    Ok(())
}

/// Merge the sheets of several workbooks into one (cell values only).
pub fn merge_workbooks(inputs: &[std::path::PathBuf], out: &Path) -> Result<(), AppError> {
    if inputs.is_empty() {
        return Err(AppError::input("No input workbooks to merge."));
    }

    let mut workbook = Workbook::new();
    let mut used = HashSet::new();

    for path in inputs {
        if !path.is_file() {
            return Err(AppError::input(format!(
                "Input workbook '{}' does not exist.",
                path.display()
            )));
        }
        let mut source: Xlsx<_> = open_workbook(path).map_err(|e| {
            AppError::fatal(format!("Failed to open workbook '{}': {e}", path.display()))
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        for sheet_name in source.sheet_names().to_owned() {
            let range = source.worksheet_range(&sheet_name).map_err(|e| {
                AppError::fatal(format!(
                    "Failed to read sheet '{sheet_name}' of '{}': {e}",
                    path.display()
                ))
            })?;

            // Prefer the original sheet name; fall back to `stem name` when
            // two inputs used the same one.
            let mut target = sheet_name.clone();
            if used.contains(&sanitized(&target)) {
                target = format!("{stem} {sheet_name}");
            }
            let target = unique_sheet_name(&target, &mut used);

            let sheet = workbook.add_worksheet();
            sheet.set_name(&target).map_err(|e| xlsx_error(out, e))?;
            copy_range(sheet, &range).map_err(|e| xlsx_error(out, e))?;
        }
    }

    workbook.save(out).map_err(|e| xlsx_error(out, e))?;
    Ok(())
}

fn copy_range(
    sheet: &mut Worksheet,
    range: &calamine::Range<Data>,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let (row0, col0) = range.start().unwrap_or((0, 0));

    for (r, row) in range.rows().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let row_idx = row0 + r as u32;
            let col_idx = col0 as u16 + c as u16;
            match cell {
                Data::Empty | Data::Error(_) => {}
                Data::String(s) => {
                    sheet.write_string(row_idx, col_idx, s)?;
                }
                Data::Float(v) => {
                    sheet.write_number(row_idx, col_idx, *v)?;
                }
                Data::Int(v) => {
                    sheet.write_number(row_idx, col_idx, *v as f64)?;
                }
                Data::Bool(b) => {
                    sheet.write_boolean(row_idx, col_idx, *b)?;
                }
                Data::DateTime(dt) => {
                    sheet.write_number(row_idx, col_idx, dt.as_f64())?;
                }
                Data::DateTimeIso(s) | Data::DurationIso(s) => {
                    sheet.write_string(row_idx, col_idx, s)?;
                }
            }
        }
    }

    Ok(())
}

/// Excel sheet names: max 31 chars, a handful of forbidden characters.
fn sanitized(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim();
    let base = if cleaned.is_empty() { "Hoja" } else { cleaned };
    base.chars().take(31).collect()
}

fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitized(name);
    let mut candidate = base.clone();
    let mut k = 2;
    while !used.insert(candidate.clone()) {
        let suffix = format!(" ({k})");
        let keep = 31usize.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        k += 1;
    }
    candidate
}

fn xlsx_error(path: &Path, e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::input(format!("Failed to write workbook '{}': {e}", path.display()))
}

//! Formatted terminal output for each pipeline stage.
//!
//! We keep formatting code in one place so:
//! - parsing/metric code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::report::normality::{ALPHA, NormalityRow};
use crate::report::{MetricStats, ParsedFile, SummaryFile};
use crate::domain::ProbeFile;

/// Maximum row-level warnings echoed per file before eliding the rest.
const MAX_ROW_WARNINGS: usize = 5;

/// Format the parse-stage summary (files, probes, row-level warnings).
pub fn format_parse_report(files: &[ParsedFile], probes: &[ProbeFile]) -> String {
    let mut out = String::new();

    let experiments: usize = probes.iter().map(|p| p.experiments.len()).sum();
    out.push_str("=== tlab - parse raw exports ===\n");
    out.push_str(&format!(
        "Files: {} | Probes: {} | Experiments: {}\n",
        files.len(),
        probes.len(),
        experiments
    ));

    for file in files {
        out.push_str(&format!(
            "- {} -> {} ({} samples)\n",
            file.source, file.probe, file.samples_used
        ));
        for err in file.row_errors.iter().take(MAX_ROW_WARNINGS) {
            out.push_str(&format!("  warning {}:{}: {}\n", file.source, err.line, err.message));
        }
        if file.row_errors.len() > MAX_ROW_WARNINGS {
            out.push_str(&format!(
                "  ... and {} more row warnings\n",
                file.row_errors.len() - MAX_ROW_WARNINGS
            ));
        }
    }

    out
}

/// Format the aggregate summary as a per-probe table.
pub fn format_summary_report(summary: &SummaryFile) -> String {
    let mut out = String::new();

    out.push_str("=== tlab - probe summary ===\n");
    out.push_str(&format!("Generated: {}\n\n", summary.generated));

    out.push_str(&format!(
        "{:<16} {:>4} {:>20} {:>20} {:>20} {:>20}\n",
        "probe", "runs", "maxTension[MPa]", "maxElongation", "ductility", "modulus[MPa]"
    ));
    out.push_str(&format!(
        "{:-<16} {:-<4} {:-<20} {:-<20} {:-<20} {:-<20}\n",
        "", "", "", "", "", ""
    ));

    for probe in &summary.probes {
        out.push_str(&format!(
            "{:<16} {:>4} {:>20} {:>20} {:>20} {:>20}\n",
            truncate(&probe.probe, 16),
            probe.n_experiments,
            fmt_stats(probe.max_tension_mpa.as_ref()),
            fmt_stats(probe.max_elongation.as_ref()),
            fmt_stats(probe.ductility.as_ref()),
            fmt_stats(probe.modulus_mpa.as_ref()),
        ));
    }

    out
}

/// Format the normality-test rows.
pub fn format_normality_report(rows: &[NormalityRow]) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== tlab - Shapiro-Wilk (alpha={ALPHA}) ===\n"));
    out.push_str(&format!(
        "{:<16} {:>4} {:>10} {:>10} {:<8} note\n",
        "metric", "n", "W", "p", "normal?"
    ));

    for row in rows {
        let (w, p, verdict) = match row.test {
            Some(test) => (
                format!("{:.4}", test.w),
                format!("{:.4}", test.p_value),
                if test.p_value >= ALPHA { "yes" } else { "no" }.to_string(),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{:<16} {:>4} {:>10} {:>10} {:<8} {}\n",
            row.metric,
            row.n,
            w,
            p,
            verdict,
            row.note.as_deref().unwrap_or("")
        ));
    }

    out
}

fn fmt_stats(stats: Option<&MetricStats>) -> String {
    match stats {
        Some(s) if s.n >= 2 => format!("{:.4} +/- {:.4}", s.mean, s.std),
        Some(s) => format!("{:.4}", s.mean),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::raw::RowError;

    #[test]
    fn parse_report_lists_files_and_warnings() {
        let files = vec![ParsedFile {
            source: "PA3_1.txt".to_string(),
            probe: "PA3".to_string(),
            samples_used: 120,
            row_errors: vec![RowError {
                line: 44,
                message: "Invalid numeric value 'x' in column `loadN`.".to_string(),
            }],
        }];

        let report = format_parse_report(&files, &[]);
        assert!(report.contains("PA3_1.txt -> PA3 (120 samples)"));
        assert!(report.contains("warning PA3_1.txt:44"));
    }

    #[test]
    fn summary_report_renders_missing_metrics_as_dashes() {
        let summary = SummaryFile {
            tool: "tlab".to_string(),
            generated: chrono::NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            probes: vec![crate::report::ProbeSummary {
                probe: "PB1".to_string(),
                n_experiments: 1,
                max_tension_mpa: None,
                max_elongation: None,
                ductility: None,
                modulus_mpa: None,
            }],
        };

        let report = format_summary_report(&summary);
        assert!(report.contains("PB1"));
        assert!(report.contains('-'));
    }
}

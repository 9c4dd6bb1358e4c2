//! Aggregate summaries over parsed probes.
//!
//! We keep aggregation separate from formatting so:
//! - the summary JSON schema stays stable and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;
pub mod normality;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ProbeFile;
use crate::io::probe::TOOL_NAME;
use crate::io::raw::RowError;

/// Per-file parse diagnostics, kept for the terminal report.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub source: String,
    pub probe: String,
    pub samples_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Summary statistics for one metric across a probe's experiments.
///
/// `values` is aligned with the probe's experiment order; `None` marks an
/// experiment where the metric was not available (e.g. ductility without a
/// `finalLength`). The moments are computed over the present values only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1); 0 when fewer than two values.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub values: Vec<Option<f64>>,
}

/// Aggregate statistics for one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSummary {
    pub probe: String,
    pub n_experiments: usize,
    #[serde(rename = "maxTensionMPa")]
    pub max_tension_mpa: Option<MetricStats>,
    pub max_elongation: Option<MetricStats>,
    pub ductility: Option<MetricStats>,
    #[serde(rename = "modulusMPa")]
    pub modulus_mpa: Option<MetricStats>,
}

/// The aggregate summary JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFile {
    pub tool: String,
    pub generated: NaiveDate,
    pub probes: Vec<ProbeSummary>,
}

/// Build the aggregate summary over all probes.
pub fn summarize(probes: &[ProbeFile]) -> SummaryFile {
    let probes = probes.iter().map(summarize_probe).collect();
    SummaryFile {
        tool: TOOL_NAME.to_string(),
        generated: chrono::Local::now().date_naive(),
        probes,
    }
}

fn summarize_probe(probe: &ProbeFile) -> ProbeSummary {
    let max_tension: Vec<Option<f64>> = probe
        .experiments
        .iter()
        .map(|e| Some(e.metrics.max_tension_mpa))
        .collect();
    let max_elongation: Vec<Option<f64>> = probe
        .experiments
        .iter()
        .map(|e| Some(e.metrics.max_elongation))
        .collect();
    let ductility: Vec<Option<f64>> = probe
        .experiments
        .iter()
        .map(|e| e.metrics.ductility)
        .collect();
    let modulus: Vec<Option<f64>> = probe
        .experiments
        .iter()
        .map(|e| e.metrics.modulus.as_ref().map(|m| m.slope_mpa))
        .collect();

    ProbeSummary {
        probe: probe.probe.clone(),
        n_experiments: probe.experiments.len(),
        max_tension_mpa: stats_of(max_tension),
        max_elongation: stats_of(max_elongation),
        ductility: stats_of(ductility),
        modulus_mpa: stats_of(modulus),
    }
}

/// Compute moments over the present values; `None` when nothing is present.
fn stats_of(values: Vec<Option<f64>>) -> Option<MetricStats> {
    let present: Vec<f64> = values.iter().filter_map(|v| *v).filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return None;
    }

    let n = present.len();
    let mean = present.iter().sum::<f64>() / n as f64;
    let std = if n >= 2 {
        (present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(MetricStats {
        n,
        mean,
        std,
        min,
        max,
        values,
    })
}

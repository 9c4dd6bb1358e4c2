//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while parsing raw exports
//! - dumped to per-probe JSON files
//! - reloaded later for spreadsheets, plots, and summaries

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Specimen cross-section in mm² (flat dog-bone probes, fixed geometry).
pub const CROSS_SECTION_MM2: f64 = 40.0;

/// Gauge length in mm between the extensometer knives.
pub const GAUGE_LENGTH_MM: f64 = 60.0;

/// Canonical channel name for the derived tension series.
pub const CHANNEL_TENSION: &str = "tensionMPa";

/// Canonical channel name for the derived elongation (strain) series.
pub const CHANNEL_ELONGATION: &str = "elongation";

/// How a raw export is split into header and samples.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Field separator of the export.
    pub separator: char,
    /// Number of metadata header lines before the column-name row.
    pub header_lines: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            separator: ';',
            header_lines: 40,
        }
    }
}

/// A parsed header field value.
///
/// Two-field header lines are untyped (`Text`, unit `"none"`); three-field
/// lines carry a numeric value plus the unit the machine printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldScalar {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: FieldScalar,
    pub unit: String,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: FieldScalar::Text(value.into()),
            unit: "none".to_string(),
        }
    }

    pub fn number(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value: FieldScalar::Number(value),
            unit: unit.into(),
        }
    }

    /// Numeric view of the value, accepting decimal-comma text.
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            FieldScalar::Number(v) => Some(*v),
            FieldScalar::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        }
    }
}

/// Young's modulus fit over the elastic region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulusFit {
    /// Slope of the zero-intercept tension/elongation fit, in MPa.
    #[serde(rename = "slopeMPa")]
    pub slope_mpa: f64,
    /// Coefficient of determination of the fit (uncentered, through-origin).
    #[serde(rename = "rSquared")]
    pub r_squared: f64,
    /// Number of samples used by the fit.
    pub n: usize,
}

/// Headline quantities derived from one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(rename = "maxTensionMPa")]
    pub max_tension_mpa: f64,
    #[serde(rename = "maxElongation")]
    pub max_elongation: f64,
    /// `(finalLength - gauge) / gauge`; absent when the header carried no
    /// usable `finalLength` (probe slipped out before break, typically).
    pub ductility: Option<f64>,
    /// Absent when the elastic-region fit was not solvable.
    pub modulus: Option<ModulusFit>,
}

/// One raw data file: one test run on a probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// File stem, e.g. `PA3_2`.
    pub name: String,
    /// Original file name the run was parsed from.
    pub source: String,
    /// Run index within the probe.
    pub index: usize,
    /// Test date from the `experimentDate` header field, when parseable.
    pub date: Option<NaiveDate>,
    /// Canonical key → header value.
    pub metadata: BTreeMap<String, FieldValue>,
    /// Canonical channel name → samples. All channels have equal length.
    pub channels: BTreeMap<String, Vec<f64>>,
    pub metrics: DerivedMetrics,
}

impl Experiment {
    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    /// Number of samples (all channels are kept equal length by the parser).
    pub fn sample_count(&self) -> usize {
        self.channels.values().map(Vec::len).next().unwrap_or(0)
    }
}

/// A probe JSON file: one physical specimen and all its runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeFile {
    pub tool: String,
    /// Filename-derived root name, e.g. `PA3`.
    pub probe: String,
    pub experiments: Vec<Experiment>,
}

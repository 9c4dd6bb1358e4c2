//! Derived-metric computation.
//!
//! Given the parsed channels and header of one experiment we compute the
//! headline quantities: maxima of the derived series, ductility from the
//! final gauge length, and the Young's modulus fit.

pub mod modulus;

use std::collections::BTreeMap;

use crate::domain::{
    CHANNEL_ELONGATION, CHANNEL_TENSION, DerivedMetrics, FieldValue, GAUGE_LENGTH_MM,
};
use crate::error::AppError;

pub use modulus::fit_elastic_modulus;

/// Compute all derived metrics for one experiment.
///
/// Fails with a data error when the export carried no load/extension columns
/// (no derived channels → nothing to report on).
pub fn compute_metrics(
    metadata: &BTreeMap<String, FieldValue>,
    channels: &BTreeMap<String, Vec<f64>>,
) -> Result<DerivedMetrics, AppError> {
    let tension = channels
        .get(CHANNEL_TENSION)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::no_data("Export has no usable load/extension samples; cannot derive metrics.")
        })?;
    let elongation = channels
        .get(CHANNEL_ELONGATION)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::no_data("Export has no usable load/extension samples; cannot derive metrics.")
        })?;

    let max_tension_mpa = max_of(tension);
    let max_elongation = max_of(elongation);

    let ductility = ductility_from_metadata(metadata);

    // Elastic region: the first half of the curve, before necking sets in.
    let half = tension.len().min(elongation.len()) / 2;
    let modulus = if half >= 2 {
        fit_elastic_modulus(&elongation[..half], &tension[..half])
    } else {
        None
    };

    Ok(DerivedMetrics {
        max_tension_mpa,
        max_elongation,
        ductility,
        modulus,
    })
}

/// `(finalLength - gauge) / gauge`, only when the header actually carried a
/// numeric `finalLength`.
pub fn ductility_from_metadata(metadata: &BTreeMap<String, FieldValue>) -> Option<f64> {
    let final_length = metadata.get("finalLength")?.as_f64()?;
    Some((final_length - GAUGE_LENGTH_MM) / GAUGE_LENGTH_MM)
}

fn max_of(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn channels(tension: &[f64], elongation: &[f64]) -> BTreeMap<String, Vec<f64>> {
        let mut map = BTreeMap::new();
        map.insert(CHANNEL_TENSION.to_string(), tension.to_vec());
        map.insert(CHANNEL_ELONGATION.to_string(), elongation.to_vec());
        map
    }

    #[test]
    fn ductility_from_known_final_length() {
        let mut metadata = BTreeMap::new();
        metadata.insert("finalLength".to_string(), FieldValue::number(65.0, "mm"));
        let d = ductility_from_metadata(&metadata).unwrap();
        assert!((d - 5.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn ductility_requires_final_length() {
        let metadata = BTreeMap::new();
        assert_eq!(ductility_from_metadata(&metadata), None);
    }

    #[test]
    fn maxima_and_modulus_on_linear_data() {
        // tension = 1250 * elongation, perfectly elastic everywhere.
        let elongation: Vec<f64> = (1..=10).map(|i| i as f64 * 1e-3).collect();
        let tension: Vec<f64> = elongation.iter().map(|e| 1250.0 * e).collect();

        let metrics = compute_metrics(&BTreeMap::new(), &channels(&tension, &elongation)).unwrap();
        assert!((metrics.max_tension_mpa - 12.5).abs() < 1e-12);
        assert!((metrics.max_elongation - 0.01).abs() < 1e-12);
        assert_eq!(metrics.ductility, None);

        let modulus = metrics.modulus.unwrap();
        assert!((modulus.slope_mpa - 1250.0).abs() < 1e-6);
        assert!((modulus.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(modulus.n, 5);
    }

    #[test]
    fn missing_derived_channels_is_no_data() {
        let err = compute_metrics(&BTreeMap::new(), &BTreeMap::new()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

//! Young's modulus via a zero-intercept least-squares fit.
//!
//! Stress is proportional to strain in the elastic region and both derived
//! series start at zero load, so the regression line is forced through the
//! origin: a single-column design matrix of elongation values against the
//! observed tension.
//!
//! R² follows the through-origin convention (uncentered total sum of
//! squares), which is the one that makes `R² = 1` mean "exactly
//! proportional".

use nalgebra::{DMatrix, DVector};

use crate::domain::ModulusFit;
use crate::math::solve_least_squares;

/// Fit `tension = E * elongation` over the given (equal-length) slices.
///
/// Returns `None` when the fit is degenerate: fewer than two samples, an
/// elongation channel that never moved, or an unsolvable system.
pub fn fit_elastic_modulus(elongation: &[f64], tension: &[f64]) -> Option<ModulusFit> {
    let n = elongation.len().min(tension.len());
    if n < 2 {
        return None;
    }

    let ss_tot: f64 = tension[..n].iter().map(|y| y * y).sum();
    if ss_tot <= 0.0 {
        return None;
    }

    let x = DMatrix::from_iterator(n, 1, elongation[..n].iter().copied());
    let y = DVector::from_iterator(n, tension[..n].iter().copied());

    let beta = solve_least_squares(&x, &y)?;
    let slope = beta[0];

    let ss_res: f64 = elongation[..n]
        .iter()
        .zip(&tension[..n])
        .map(|(e, t)| {
            let r = t - slope * e;
            r * r
        })
        .sum();

    let r_squared = 1.0 - ss_res / ss_tot;
    if !(slope.is_finite() && r_squared.is_finite()) {
        return None;
    }

    Some(ModulusFit {
        slope_mpa: slope,
        r_squared,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_true_ratio_on_proportional_data() {
        let elongation: Vec<f64> = (1..=8).map(|i| i as f64 * 2e-3).collect();
        let tension: Vec<f64> = elongation.iter().map(|e| 900.0 * e).collect();

        let fit = fit_elastic_modulus(&elongation, &tension).unwrap();
        assert!((fit.slope_mpa - 900.0).abs() < 1e-6);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(fit.n, 8);
    }

    #[test]
    fn noisy_data_keeps_r_squared_below_one() {
        let elongation = [0.001, 0.002, 0.003, 0.004];
        let tension = [1.1, 1.9, 3.2, 3.8];
        let fit = fit_elastic_modulus(&elongation, &tension).unwrap();
        assert!(fit.r_squared < 1.0);
        assert!(fit.r_squared > 0.9);
        assert!(fit.slope_mpa > 0.0);
    }

    #[test]
    fn degenerate_inputs_yield_none() {
        assert!(fit_elastic_modulus(&[0.001], &[1.0]).is_none());
        assert!(fit_elastic_modulus(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).is_none());
    }
}

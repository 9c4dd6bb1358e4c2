//! Shapiro–Wilk normality test (AS R94, Royston 1995).
//!
//! The W statistic correlates the ordered sample with the expected order
//! statistics of a standard normal:
//!
//! ```text
//! W = (Σ a_i x_(i))² / Σ (x_i - x̄)²
//! ```
//!
//! The `a` weights come from Blom-style normal scores plus Royston's
//! polynomial corrections for the two extreme weights; the p-value uses
//! Royston's normalizing transforms of `1 - W` (separate regimes for
//! n = 3, 4..=11, and >= 12).
//!
//! Numerical notes:
//! - Weights are antisymmetric, so only the upper half needs correction.
//! - `W` is clamped to `<= 1`; the transform argument is guarded so extreme
//!   samples map to p = 0 instead of NaN.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::AppError;

/// Test outcome for one metric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Royston's polynomial correction for the largest weight `a_n`.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
/// Correction for the second-largest weight `a_{n-1}` (used when n > 5).
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
/// Mean of the transformed statistic, n in 4..=11.
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -0.0006714];
/// Log standard deviation of the transformed statistic, n in 4..=11.
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
/// Mean of the transformed statistic, n >= 12 (argument is ln n).
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
/// Log standard deviation of the transformed statistic, n >= 12.
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

/// Run the Shapiro–Wilk test on a sample.
///
/// Requires `n >= 3` and a non-constant sample; both are data errors here,
/// not panics, because the sample sizes come straight from how many probes a
/// campaign happened to test.
pub fn shapiro_wilk(sample: &[f64]) -> Result<ShapiroWilk, AppError> {
    let n = sample.len();
    if n < 3 {
        return Err(AppError::no_data(format!(
            "Shapiro-Wilk needs at least 3 observations, got {n}."
        )));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(AppError::no_data("Shapiro-Wilk input contains non-finite values."));
    }

    let mut x: Vec<f64> = sample.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    if ss <= 0.0 {
        return Err(AppError::no_data(
            "Shapiro-Wilk is undefined for a constant sample.",
        ));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::fatal(format!("Failed to build normal distribution: {e}")))?;

    // Expected normal order statistics (Blom approximation).
    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let ssq_m: f64 = m.iter().map(|v| v * v).sum();

    let a = weights(n, &m, ssq_m);

    let num: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum();
    let w = (num * num / ss).min(1.0);

    let p_value = p_value(n, w, &normal);

    Ok(ShapiroWilk { w, p_value, n })
}

fn weights(n: usize, m: &[f64], ssq_m: f64) -> Vec<f64> {
    if n == 3 {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        return vec![-a, 0.0, a];
    }

    let u = 1.0 / (n as f64).sqrt();
    let rsq = ssq_m.sqrt();

    let a_n = poly(&C1, u) + m[n - 1] / rsq;

    let (phi, a_n1) = if n > 5 {
        let a_n1 = poly(&C2, u) + m[n - 2] / rsq;
        let phi = (ssq_m - 2.0 * m[n - 1] * m[n - 1] - 2.0 * m[n - 2] * m[n - 2])
            / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1);
        (phi, Some(a_n1))
    } else {
        let phi = (ssq_m - 2.0 * m[n - 1] * m[n - 1]) / (1.0 - 2.0 * a_n * a_n);
        (phi, None)
    };

    let phi_root = phi.max(f64::MIN_POSITIVE).sqrt();
    let mut a: Vec<f64> = m.iter().map(|mi| mi / phi_root).collect();

    a[n - 1] = a_n;
    a[0] = -a_n;
    if let Some(a_n1) = a_n1 {
        a[n - 2] = a_n1;
        a[1] = -a_n1;
    }

    a
}

fn p_value(n: usize, w: f64, normal: &Normal) -> f64 {
    if w >= 1.0 {
        return 1.0;
    }

    if n == 3 {
        // Exact for n = 3 (Royston 1995, eq. for the smallest sample).
        let p = (6.0 / std::f64::consts::PI)
            * ((w.sqrt()).asin() - (0.75f64).sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let z = if n <= 11 {
        let nf = n as f64;
        let gamma = -2.273 + 0.459 * nf;
        let arg = gamma - (1.0 - w).ln();
        if arg <= 0.0 {
            // Transform out of range: the sample is about as non-normal as
            // this approximation can express.
            return 0.0;
        }
        let mu = poly(&C3, nf);
        let sigma = poly(&C4, nf).exp();
        (-arg.ln() - mu) / sigma
    } else {
        let ln_n = (n as f64).ln();
        let mu = poly(&C5, ln_n);
        let sigma = poly(&C6, ln_n).exp();
        ((1.0 - w).ln() - mu) / sigma
    };

    (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
}

/// Evaluate `c[0] + c[1] x + c[2] x² + ...` (Horner).
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_three_symmetric_points() {
        let r = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((r.w - 1.0).abs() < 1e-12, "W should be 1, got {}", r.w);
        assert!((r.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn near_normal_sample_scores_high() {
        // Data equal to the expected normal order statistics is as normal as
        // a sample can look.
        let normal = Normal::new(0.0, 1.0).unwrap();
        let n = 20;
        let x: Vec<f64> = (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect();
        let r = shapiro_wilk(&x).unwrap();
        assert!(r.w > 0.98, "W = {}", r.w);
        assert!(r.p_value > 0.5, "p = {}", r.p_value);
    }

    #[test]
    fn geometric_sample_is_rejected() {
        let x: Vec<f64> = (0..20).map(|i| 2f64.powi(i)).collect();
        let r = shapiro_wilk(&x).unwrap();
        assert!(r.w < 0.85, "W = {}", r.w);
        assert!(r.p_value < 0.01, "p = {}", r.p_value);
    }

    #[test]
    fn rejects_degenerate_samples() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
        assert!(shapiro_wilk(&[5.0; 8]).is_err());
    }

    #[test]
    fn weights_are_antisymmetric() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let n = 12;
        let m: Vec<f64> = (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect();
        let ssq_m: f64 = m.iter().map(|v| v * v).sum();
        let a = weights(n, &m, ssq_m);
        for i in 0..n {
            assert!((a[i] + a[n - 1 - i]).abs() < 1e-12);
        }
    }
}

//! Comparison statistics between a prediction and data.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Which statistic a sample contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    /// Covariance quadratic form `rᵀ C⁻¹ r`.
    Chi2,
    /// Poisson log-likelihood ratio for raw event counts.
    Poisson,
}

/// `rᵀ C⁻¹ r` with `r = prediction − data`.
///
/// Uses the full inverse, so bin-to-bin correlations contribute.
pub fn chi2_quadratic(prediction: &[f64], data: &[f64], inverse: &DMatrix<f64>) -> f64 {
    let n = prediction.len();
    let r = DVector::from_iterator(n, prediction.iter().zip(data).map(|(p, d)| p - d));
    r.dot(&(inverse * &r))
}

/// `2 Σ (μ − n + n ln(n/μ))` over bins.
///
/// Bins with `n = 0` contribute `2μ`. A bin with `μ ≤ 0` and `n > 0` (negative
/// weights can drive `μ` below zero) makes the result `+∞`. A NaN prediction
/// propagates.
pub fn poisson_llr(prediction: &[f64], data: &[f64]) -> f64 {
    2.0 * prediction
        .iter()
        .zip(data)
        .map(|(&mu, &n)| {
            let log_term = match (n > 0.0, mu <= 0.0) {
                (false, _) => 0.0,
                (true, true) => f64::INFINITY,
                (true, false) => n * (n / mu).ln(),
            };
            mu - n + log_term
        })
        .sum::<f64>()
}

/// Penalty `((1/norm − 1) / sigma)²` for a sample normalisation.
pub fn norm_penalty(norm: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    ((1.0 / norm - 1.0) / sigma).powi(2)
}

/// Upper-tail probability of `chi2` for `ndof` degrees of freedom.
///
/// `None` for `ndof == 0` or a non-finite statistic.
pub fn chi2_pvalue(chi2: f64, ndof: usize) -> Option<f64> {
    if ndof == 0 || !chi2.is_finite() {
        return None;
    }
    let dist = ChiSquared::new(ndof as f64).ok()?;
    Some(1.0 - dist.cdf(chi2.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quadratic_form_uses_correlations() {
        let inv_diag = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let inv_corr = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let p = [2.0, 2.0];
        let d = [1.0, 1.0];
        assert_relative_eq!(chi2_quadratic(&p, &d, &inv_diag), 2.0);
        assert_relative_eq!(chi2_quadratic(&p, &d, &inv_corr), 3.0);
        assert_eq!(chi2_quadratic(&d, &d, &inv_corr), 0.0);
    }

    #[test]
    fn poisson_zero_at_match() {
        assert_relative_eq!(poisson_llr(&[3.0, 5.0], &[3.0, 5.0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(poisson_llr(&[2.0], &[0.0]), 4.0);
        assert!(poisson_llr(&[0.0], &[1.0]).is_infinite());
    }

    #[test]
    fn poisson_negative_prediction_is_positive_infinity() {
        assert_eq!(poisson_llr(&[-1.0], &[1.0]), f64::INFINITY);
        assert_eq!(poisson_llr(&[-1.0, 2.0], &[0.0, 2.0]), -2.0);
        assert!(poisson_llr(&[f64::NAN], &[1.0]).is_nan());
    }

    #[test]
    fn penalty_and_pvalue() {
        assert_eq!(norm_penalty(1.0, 0.1), 0.0);
        assert_relative_eq!(norm_penalty(0.5, 0.5), 4.0);
        assert_eq!(norm_penalty(2.0, 0.0), 0.0);
        assert_relative_eq!(chi2_pvalue(0.0, 3).unwrap(), 1.0);
        let p = chi2_pvalue(3.84, 1).unwrap();
        assert_relative_eq!(p, 0.05, epsilon = 1e-3);
        assert!(chi2_pvalue(1.0, 0).is_none());
    }
}

//! Measured data and covariance.

use std::path::Path;

use nalgebra::DMatrix;
use nf_core::{Error, Result};
use nf_hist::Axis;
use serde::{Deserialize, Serialize};

use crate::options::CovarianceUse;

/// A measured distribution with its uncertainty model.
///
/// Uncertainties are taken, in order of preference, from `covariance`,
/// `correlation` combined with `errors`, `errors` alone (uncorrelated), or
/// Poisson `sqrt(n)` of the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredData {
    /// x bin edges.
    pub x_edges: Axis,
    /// y bin edges for 2D measurements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_edges: Option<Axis>,
    /// Central values, flattened with x fastest.
    pub values: Vec<f64>,
    /// Per-bin total errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<f64>>,
    /// Full covariance matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covariance: Option<Vec<Vec<f64>>>,
    /// Correlation matrix (requires `errors`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<Vec<Vec<f64>>>,
}

impl MeasuredData {
    /// 1D data with Poisson uncertainties.
    pub fn new_1d(x_edges: Axis, values: Vec<f64>) -> Self {
        Self { x_edges, y_edges: None, values, errors: None, covariance: None, correlation: None }
    }

    /// 2D data with Poisson uncertainties.
    pub fn new_2d(x_edges: Axis, y_edges: Axis, values: Vec<f64>) -> Self {
        Self {
            x_edges,
            y_edges: Some(y_edges),
            values,
            errors: None,
            covariance: None,
            correlation: None,
        }
    }

    /// Attach per-bin errors.
    pub fn with_errors(mut self, errors: Vec<f64>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Attach a full covariance matrix.
    pub fn with_covariance(mut self, covariance: Vec<Vec<f64>>) -> Self {
        self.covariance = Some(covariance);
        self
    }

    /// Attach a correlation matrix (used together with errors).
    pub fn with_correlation(mut self, correlation: Vec<Vec<f64>>) -> Self {
        self.correlation = Some(correlation);
        self
    }

    /// Read from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let data: MeasuredData = serde_json::from_str(&text)?;
        data.validate(&path.display().to_string())?;
        Ok(data)
    }

    /// Number of bins (nx·ny).
    pub fn n_bins(&self) -> usize {
        self.x_edges.n_bins() * self.y_edges.as_ref().map(Axis::n_bins).unwrap_or(1)
    }

    /// Number of axes (1 or 2).
    pub fn dimension(&self) -> usize {
        if self.y_edges.is_some() { 2 } else { 1 }
    }

    /// Sum of central values.
    pub fn integral(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Check that every array matches the binning.
    pub fn validate(&self, name: &str) -> Result<()> {
        let n = self.n_bins();
        if self.values.len() != n {
            return Err(Error::Validation(format!(
                "data '{name}': {} values for {n} bins",
                self.values.len()
            )));
        }
        if let Some(errors) = &self.errors
            && errors.len() != n
        {
            return Err(Error::Validation(format!(
                "data '{name}': {} errors for {n} bins",
                errors.len()
            )));
        }
        for (label, m) in [("covariance", &self.covariance), ("correlation", &self.correlation)] {
            if let Some(m) = m
                && (m.len() != n || m.iter().any(|row| row.len() != n))
            {
                return Err(Error::Validation(format!("data '{name}': {label} must be {n}x{n}")));
            }
        }
        if self.correlation.is_some() && self.errors.is_none() {
            return Err(Error::Validation(format!(
                "data '{name}': correlation matrix given without errors"
            )));
        }
        Ok(())
    }

    /// Build the covariance matrix implied by the stored uncertainties.
    pub fn covariance_matrix(&self) -> DMatrix<f64> {
        let n = self.n_bins();
        if let Some(cov) = &self.covariance {
            return DMatrix::from_fn(n, n, |i, j| cov[i][j]);
        }
        let errors: Vec<f64> = match &self.errors {
            Some(e) => e.clone(),
            None => self.values.iter().map(|v| v.abs().sqrt()).collect(),
        };
        match &self.correlation {
            Some(corr) => DMatrix::from_fn(n, n, |i, j| corr[i][j] * errors[i] * errors[j]),
            None => DMatrix::from_fn(n, n, |i, j| if i == j { errors[i] * errors[i] } else { 0.0 }),
        }
    }
}

/// Covariance matrix with its precomputed inverse.
#[derive(Debug, Clone)]
pub struct Covariance {
    matrix: DMatrix<f64>,
    inverse: DMatrix<f64>,
    usage: CovarianceUse,
}

impl Covariance {
    /// Invert `matrix` for sample `sample`.
    ///
    /// With [`CovarianceUse::Diag`] only the diagonal is inverted. A singular
    /// (or non-finite) matrix is a configuration error.
    pub fn new(sample: &str, matrix: DMatrix<f64>, usage: CovarianceUse) -> Result<Self> {
        if !matrix.is_square() {
            return Err(Error::Validation(format!("sample '{sample}': covariance is not square")));
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularCovariance(sample.to_string()));
        }

        let inverse = match usage {
            CovarianceUse::Diag => {
                let n = matrix.nrows();
                let mut inv = DMatrix::zeros(n, n);
                for i in 0..n {
                    let c = matrix[(i, i)];
                    if c <= 0.0 {
                        return Err(Error::SingularCovariance(sample.to_string()));
                    }
                    inv[(i, i)] = 1.0 / c;
                }
                inv
            }
            CovarianceUse::Full => matrix
                .clone()
                .try_inverse()
                .ok_or_else(|| Error::SingularCovariance(sample.to_string()))?,
        };
        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularCovariance(sample.to_string()));
        }
        Ok(Self { matrix, inverse, usage })
    }

    /// Covariance matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Inverse used in the quadratic form.
    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// Whether only the diagonal was inverted.
    pub fn usage(&self) -> CovarianceUse {
        self.usage
    }

    /// Square root of the diagonal.
    pub fn errors(&self) -> Vec<f64> {
        self.matrix.diagonal().iter().map(|v| v.sqrt()).collect()
    }
}

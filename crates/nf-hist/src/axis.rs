//! Fixed-edge binning.

use nf_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Where a value falls relative to an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinLocation {
    /// Below the first edge.
    Underflow,
    /// In-range bin index.
    Bin(usize),
    /// At or above the last edge (NaN values land here too).
    Overflow,
}

/// Variable-width binning defined by sorted edges (length = n_bins + 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// Build an axis, validating that edges are finite and strictly increasing.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis needs at least 2 edges (got {})",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::Validation("axis edges must be finite".into()));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Validation(format!("axis edges not strictly increasing: {edges:?}")));
        }
        Ok(Self { edges })
    }

    /// Uniform binning of `n` bins over `[lo, hi)`.
    pub fn uniform(n: usize, lo: f64, hi: f64) -> Result<Self> {
        if n == 0 {
            return Err(Error::Validation("axis needs at least one bin".into()));
        }
        let step = (hi - lo) / n as f64;
        Self::new((0..=n).map(|i| lo + step * i as f64).collect())
    }

    /// Number of in-range bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Lower edge of the first bin.
    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin.
    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Width of bin `i`.
    pub fn width(&self, i: usize) -> f64 {
        self.edges[i + 1] - self.edges[i]
    }

    /// Locate `val`. Bins are half-open `[lo, hi)`.
    pub fn locate(&self, val: f64) -> BinLocation {
        if val.is_nan() || val >= self.max() {
            return BinLocation::Overflow;
        }
        if val < self.min() {
            return BinLocation::Underflow;
        }
        // First edge strictly greater than val, minus one.
        BinLocation::Bin(self.edges.partition_point(|&e| e <= val) - 1)
    }

    /// In-range bin index for `val`, `None` for under/overflow.
    pub fn find_bin(&self, val: f64) -> Option<usize> {
        match self.locate(val) {
            BinLocation::Bin(b) => Some(b),
            _ => None,
        }
    }

    /// Whether the closed interval `[lo, hi]` touches `[min, max)`.
    pub fn overlaps(&self, lo: f64, hi: f64) -> bool {
        lo <= hi && hi >= self.min() && lo < self.max()
    }

    /// Bin index for `val`, clamped into range (underflow → 0, overflow → last).
    pub fn find_bin_clamped(&self, val: f64) -> usize {
        match self.locate(val) {
            BinLocation::Underflow => 0,
            BinLocation::Bin(b) => b,
            BinLocation::Overflow => self.n_bins() - 1,
        }
    }
}

impl TryFrom<Vec<f64>> for Axis {
    type Error = Error;

    fn try_from(edges: Vec<f64>) -> Result<Self> {
        Axis::new(edges)
    }
}

impl From<Axis> for Vec<f64> {
    fn from(axis: Axis) -> Self {
        axis.edges
    }
}

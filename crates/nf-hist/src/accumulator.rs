//! Weighted 1D/2D bin accumulator holding a sample prediction.
//!
//! Contents are stored as raw weighted sums. Two kinds of scaling apply:
//!
//! - [`HistogramAccumulator::scale`] multiplies the stored sums (used for
//!   flux/cross-section conversion) and scales errors linearly;
//! - [`HistogramAccumulator::set_norm`] sets a presentation normalisation
//!   that replaces any previously set one. All read accessors apply it.
//!
//! [`HistogramAccumulator::reset`] clears both.

use nf_core::{Error, Result};
use serde::Serialize;

use crate::axis::{Axis, BinLocation};

/// Weighted accumulator over one or two projection axes.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    name: String,
    x: Axis,
    y: Option<Axis>,
    /// Sum of weights per bin, row-major with x fastest.
    content: Vec<f64>,
    /// Sum of weights squared per bin.
    sumw2: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    norm: f64,
}

impl HistogramAccumulator {
    /// 1D accumulator over `x`.
    pub fn new_1d(name: impl Into<String>, x: Axis) -> Self {
        let n = x.n_bins();
        Self {
            name: name.into(),
            x,
            y: None,
            content: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            norm: 1.0,
        }
    }

    /// 2D accumulator over `x` × `y`.
    pub fn new_2d(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        let n = x.n_bins() * y.n_bins();
        Self {
            name: name.into(),
            x,
            y: Some(y),
            content: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            norm: 1.0,
        }
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of axes in use (1 or 2).
    pub fn dimension(&self) -> usize {
        if self.y.is_some() { 2 } else { 1 }
    }

    /// x axis.
    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    /// y axis for 2D accumulators.
    pub fn y_axis(&self) -> Option<&Axis> {
        self.y.as_ref()
    }

    /// Total number of in-range bins (nx·ny).
    pub fn n_bins(&self) -> usize {
        self.content.len()
    }

    /// Flattened bin index for `(ix, iy)`.
    #[inline]
    pub fn flat_index(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.n_bins() + ix
    }

    /// Zero all bins and drop the normalisation state.
    pub fn reset(&mut self) {
        self.content.iter_mut().for_each(|c| *c = 0.0);
        self.sumw2.iter_mut().for_each(|c| *c = 0.0);
        self.underflow = 0.0;
        self.overflow = 0.0;
        self.entries = 0;
        self.norm = 1.0;
    }

    /// Add `weight` at `(x, y)`. `y` is ignored for 1D, `z` is never binned.
    ///
    /// Weights are not checked: NaN or infinite weights end up in the bins.
    pub fn fill(&mut self, x: f64, y: f64, _z: f64, weight: f64) {
        let ix = self.x.locate(x);
        let iy = match &self.y {
            Some(axis) => axis.locate(y),
            None => BinLocation::Bin(0),
        };
        self.entries += 1;
        match (ix, iy) {
            (BinLocation::Bin(i), BinLocation::Bin(j)) => {
                let b = self.flat_index(i, j);
                self.content[b] += weight;
                self.sumw2[b] += weight * weight;
            }
            (BinLocation::Underflow, _) | (_, BinLocation::Underflow) => self.underflow += weight,
            _ => self.overflow += weight,
        }
    }

    /// Multiply stored sums by `factor`; errors scale linearly with it.
    pub fn scale(&mut self, factor: f64) {
        let f2 = factor * factor;
        self.content.iter_mut().for_each(|c| *c *= factor);
        self.sumw2.iter_mut().for_each(|c| *c *= f2);
        self.underflow *= factor;
        self.overflow *= factor;
    }

    /// Divide each bin by its width (area for 2D).
    pub fn divide_by_bin_width(&mut self) {
        let nx = self.x.n_bins();
        for b in 0..self.content.len() {
            let (ix, iy) = (b % nx, b / nx);
            let w = self.x.width(ix) * self.y.as_ref().map(|a| a.width(iy)).unwrap_or(1.0);
            self.content[b] /= w;
            self.sumw2[b] /= w * w;
        }
    }

    /// Set the normalisation applied on read, replacing any previous one.
    pub fn set_norm(&mut self, norm: f64) {
        self.norm = norm;
    }

    /// Currently applied normalisation.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Normalised content of flattened bin `b`.
    pub fn bin_content(&self, b: usize) -> f64 {
        self.content[b] * self.norm
    }

    /// Normalised content of bin `(ix, iy)`.
    pub fn bin_content_2d(&self, ix: usize, iy: usize) -> f64 {
        self.bin_content(self.flat_index(ix, iy))
    }

    /// Normalised error `sqrt(sumw2)·|norm|` of flattened bin `b`.
    pub fn bin_error(&self, b: usize) -> f64 {
        self.sumw2[b].sqrt() * self.norm.abs()
    }

    /// Normalised contents of all bins (flattened).
    pub fn contents(&self) -> Vec<f64> {
        self.content.iter().map(|c| c * self.norm).collect()
    }

    /// Normalised errors of all bins (flattened).
    pub fn errors(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|b| self.bin_error(b)).collect()
    }

    /// Number of fill calls since the last reset.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Normalised weight that fell below the axes.
    pub fn underflow(&self) -> f64 {
        self.underflow * self.norm
    }

    /// Normalised weight that fell above the axes (or had a NaN position).
    pub fn overflow(&self) -> f64 {
        self.overflow * self.norm
    }

    /// Normalised sum over all in-range bins.
    pub fn integral(&self) -> f64 {
        self.content.iter().sum::<f64>() * self.norm
    }

    /// Normalised sum over all bins, weighted by bin width (area in 2D).
    pub fn integral_width(&self) -> f64 {
        let nx = self.x.n_bins();
        let s: f64 = self
            .content
            .iter()
            .enumerate()
            .map(|(b, c)| {
                let (ix, iy) = (b % nx, b / nx);
                c * self.x.width(ix) * self.y.as_ref().map(|a| a.width(iy)).unwrap_or(1.0)
            })
            .sum();
        s * self.norm
    }

    /// Normalised sum over x bins `first..=last` (all y bins for 2D).
    pub fn integral_bins(&self, first: usize, last: usize) -> f64 {
        let nx = self.x.n_bins();
        let last = last.min(nx - 1);
        if first > last {
            return 0.0;
        }
        let ny = self.y.as_ref().map(Axis::n_bins).unwrap_or(1);
        let mut s = 0.0;
        for iy in 0..ny {
            for ix in first..=last {
                s += self.content[self.flat_index(ix, iy)];
            }
        }
        s * self.norm
    }

    /// Normalised sum from the x bin containing `lo` through the x bin containing `hi`.
    ///
    /// Zero when `[lo, hi]` lies entirely outside the x axis.
    pub fn integral_range(&self, lo: f64, hi: f64) -> f64 {
        if !self.x.overlaps(lo, hi) {
            return 0.0;
        }
        self.integral_bins(self.x.find_bin_clamped(lo), self.x.find_bin_clamped(hi))
    }

    /// Copy the normalised state into a serializable snapshot.
    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            name: self.name.clone(),
            x_edges: self.x.edges().to_vec(),
            y_edges: self.y.as_ref().map(|a| a.edges().to_vec()),
            contents: self.contents(),
            errors: self.errors(),
            norm: self.norm,
            entries: self.entries,
        }
    }

    /// Check that `values` has one entry per bin.
    pub fn check_len(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.n_bins() {
            return Err(Error::Validation(format!(
                "'{}': expected {} bin values, got {}",
                self.name,
                self.n_bins(),
                values.len()
            )));
        }
        Ok(())
    }
}

/// Serializable view of an accumulator.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    /// Accumulator name.
    pub name: String,
    /// x bin edges.
    pub x_edges: Vec<f64>,
    /// y bin edges (2D only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_edges: Option<Vec<f64>>,
    /// Normalised contents (flattened, x fastest).
    pub contents: Vec<f64>,
    /// Normalised errors.
    pub errors: Vec<f64>,
    /// Applied normalisation.
    pub norm: f64,
    /// Fill count.
    pub entries: u64,
}

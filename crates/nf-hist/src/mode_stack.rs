//! Prediction broken down by interaction mode.
//!
//! A [`ModeStack`] holds one [`HistogramAccumulator`] per mode seen since the
//! last reset, all sharing the binning of a template. Scaling and
//! normalisation act on every layer, so the layers always sum to the
//! prediction they were filled alongside.

use std::collections::BTreeMap;

use crate::accumulator::{HistogramAccumulator, HistogramSnapshot};

/// Per-mode accumulators over a common binning.
#[derive(Debug, Clone)]
pub struct ModeStack {
    template: HistogramAccumulator,
    layers: BTreeMap<i32, HistogramAccumulator>,
    norm: f64,
}

impl ModeStack {
    /// Empty stack with the binning (and name prefix) of `template`.
    pub fn new(template: &HistogramAccumulator) -> Self {
        let mut template = template.clone();
        template.reset();
        Self { template, layers: BTreeMap::new(), norm: 1.0 }
    }

    /// Drop every layer.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.norm = 1.0;
    }

    /// Add `weight` at `(x, y)` to the layer for `mode`.
    pub fn fill(&mut self, mode: i32, x: f64, y: f64, z: f64, weight: f64) {
        let template = &self.template;
        let norm = self.norm;
        self.layers
            .entry(mode)
            .or_insert_with(|| {
                let mut layer = template.clone();
                layer.set_norm(norm);
                layer
            })
            .fill(x, y, z, weight);
    }

    /// Multiply every layer by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.layers.values_mut().for_each(|h| h.scale(factor));
    }

    /// Divide every layer by its bin widths.
    pub fn divide_by_bin_width(&mut self) {
        self.layers.values_mut().for_each(HistogramAccumulator::divide_by_bin_width);
    }

    /// Set the read normalisation of every layer, replacing the previous one.
    pub fn set_norm(&mut self, norm: f64) {
        self.norm = norm;
        self.layers.values_mut().for_each(|h| h.set_norm(norm));
    }

    /// Modes present, ascending.
    pub fn modes(&self) -> impl Iterator<Item = i32> + '_ {
        self.layers.keys().copied()
    }

    /// Layer for `mode`.
    pub fn get(&self, mode: i32) -> Option<&HistogramAccumulator> {
        self.layers.get(&mode)
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// No layers filled since the last reset.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Bin-by-bin sum over all layers (normalised).
    pub fn total(&self) -> Vec<f64> {
        let mut sum = vec![0.0; self.template.n_bins()];
        for layer in self.layers.values() {
            for (s, c) in sum.iter_mut().zip(layer.contents()) {
                *s += c;
            }
        }
        sum
    }

    /// Snapshot of every layer keyed by mode.
    pub fn snapshot(&self) -> BTreeMap<i32, HistogramSnapshot> {
        self.layers.iter().map(|(&m, h)| (m, h.snapshot())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Axis;
    use approx::assert_relative_eq;

    fn stack() -> ModeStack {
        ModeStack::new(&HistogramAccumulator::new_1d("pred", Axis::new(vec![0.0, 1.0, 3.0]).unwrap()))
    }

    #[test]
    fn layers_sum_to_total() {
        let mut s = stack();
        s.fill(11, 0.5, 0.0, 0.0, 2.0);
        s.fill(13, 0.5, 0.0, 0.0, 1.0);
        s.fill(11, 2.0, 0.0, 0.0, 4.0);
        assert_eq!(s.modes().collect::<Vec<_>>(), vec![11, 13]);
        assert_eq!(s.get(11).unwrap().contents(), vec![2.0, 4.0]);
        assert_eq!(s.total(), vec![3.0, 4.0]);
        assert!(s.get(12).is_none());
    }

    #[test]
    fn scaling_and_norm_reach_every_layer() {
        let mut s = stack();
        s.fill(11, 0.5, 0.0, 0.0, 2.0);
        s.fill(21, 2.0, 0.0, 0.0, 4.0);
        s.scale(3.0);
        s.divide_by_bin_width();
        assert_eq!(s.total(), vec![6.0, 6.0]);

        s.set_norm(0.5);
        s.set_norm(2.0);
        assert_relative_eq!(s.total()[0], 12.0);
        // a layer created after set_norm picks the norm up
        s.fill(31, 0.5, 0.0, 0.0, 1.0);
        assert_eq!(s.get(31).unwrap().norm(), 2.0);
    }

    #[test]
    fn reset_drops_layers() {
        let mut s = stack();
        s.fill(11, 0.5, 0.0, 0.0, 1.0);
        s.set_norm(4.0);
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.total(), vec![0.0, 0.0]);
        s.fill(11, 0.5, 0.0, 0.0, 1.0);
        assert_eq!(s.get(11).unwrap().norm(), 1.0);
        assert_eq!(s.snapshot()[&11].contents, vec![1.0, 0.0]);
    }
}

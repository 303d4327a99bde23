//! # nf-hist
//!
//! Histograms for nufit: fixed-edge [`Axis`] binning, the 1D [`Histogram`]
//! used for flux and event-rate inputs, and the weighted
//! [`HistogramAccumulator`] that holds a sample's prediction, plus the
//! per-mode [`ModeStack`] filled alongside it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod axis;
pub mod histogram;
pub mod mode_stack;

pub use accumulator::{HistogramAccumulator, HistogramSnapshot};
pub use axis::{Axis, BinLocation};
pub use histogram::Histogram;
pub use mode_stack::ModeStack;

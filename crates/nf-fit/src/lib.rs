//! # nf-fit
//!
//! Joint comparisons over several measurement units.
//!
//! This crate provides:
//! - [`JointComparison`]: ordered units summed into one statistic
//! - [`DialWeightEngine`]: a dial-driven [`nf_core::ReweightEngine`]
//! - [`create_sample`]: build a unit from a sample configuration key
//! - [`ComparisonRoutines`]: parameter/sample setup, fake data and the
//!   `Compare` routine

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Joint comparison of measurement units.
pub mod joint;
/// Comparison routines driven by a configuration.
pub mod routines;
/// Sample construction from configuration keys.
pub mod sample_list;
/// Dial-driven reweighting engine.
pub mod weight;

pub use joint::{FakeData, JointComparison, JointSummary};
pub use routines::{ComparisonReport, ComparisonRoutines, ParameterSpec, RoutineConfig};
pub use sample_list::{create_sample, load_source};
pub use weight::{DialKind, DialWeightEngine};

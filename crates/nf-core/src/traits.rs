//! Core traits for nufit
//!
//! The reconfiguration engine depends only on these capabilities, never on
//! concrete generators, file formats or weight calculators.

use std::borrow::Cow;

use crate::Result;
use crate::types::{DialState, InteractionRecord, ProjectionValues};

/// Indexed, random-access supply of interaction records.
///
/// Record contents must be stable for the lifetime of the source: the signal
/// cache stores indices and relies on `record(i)` returning the same event on
/// every call.
pub trait EventSource: Send + Sync {
    /// Total number of records.
    fn count(&self) -> usize;

    /// Record at `index`, or `None` if out of range.
    fn record(&self, index: usize) -> Option<Cow<'_, InteractionRecord>>;

    /// Integrated flux between `enu_min` and `enu_max` (MeV), bin-width weighted.
    ///
    /// `None` when the source carries no flux information.
    fn flux_integral(&self, _enu_min: f64, _enu_max: f64) -> Option<f64> {
        None
    }

    /// Bin-width weighted integral of the generated event-rate histogram.
    fn event_rate_integral(&self) -> Option<f64> {
        None
    }

    /// Human-readable label used in logs.
    fn label(&self) -> &str {
        "events"
    }
}

/// Maps a record and the current dial state to a weight.
///
/// `calc_weight` must be pure for a fixed dial state. Closures of the form
/// `Fn(&InteractionRecord, &DialState) -> f64` implement this trait.
pub trait ReweightEngine: Send + Sync {
    /// Engine-internal refresh, called once before passes after dials change.
    fn reconfigure(&mut self, _dials: &DialState) -> Result<()> {
        Ok(())
    }

    /// Weight of `record` under `dials` (excluding the record's input weight).
    fn calc_weight(&self, record: &InteractionRecord, dials: &DialState) -> f64;

    /// Engine name (e.g. "dial", "custom")
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ReweightEngine for F
where
    F: Fn(&InteractionRecord, &DialState) -> f64 + Send + Sync,
{
    fn calc_weight(&self, record: &InteractionRecord, dials: &DialState) -> f64 {
        self(record, dials)
    }
}

/// Signal definition and projection for one analysis channel.
///
/// Implementations never see the dial state, so signal classification cannot
/// depend on reweighting parameters.
pub trait SignalPredicate: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Projection variables for `record`. Missing final-state content leaves
    /// the defaults in place.
    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues;

    /// Whether `record` belongs to this channel's signal definition.
    fn is_signal(&self, record: &InteractionRecord) -> bool;
}

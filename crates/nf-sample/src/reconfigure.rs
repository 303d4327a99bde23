//! Full and fast reconfiguration passes.
//!
//! A full pass visits every record, rebuilds the signal cache and fills the
//! prediction. A fast pass refills the prediction from the cached projection
//! values, recomputing only the weights. Both finish with the same
//! event-rate conversion and normalisation, so for any dial state a fast pass
//! yields the same histogram as a full pass would.

use nf_core::{DialState, Error, Result, ReweightEngine};
use serde::Serialize;

use crate::measurement::MeasurementUnit;
use crate::options::{NormState, ScaleMode};

/// Whether the signal cache reflects the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheValidity {
    /// Nothing cached; the next pass must scan every record.
    Empty,
    /// Cache built by a full pass.
    Full,
}

/// Kind of pass actually performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconfigureMode {
    /// Every record visited.
    Full,
    /// Only cached signal records visited.
    Fast,
}

/// Summary of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Pass kind.
    pub mode: ReconfigureMode,
    /// Records visited.
    pub n_events_scanned: usize,
    /// Signal records filled.
    pub n_signal: usize,
    /// Version of the dial state the weights were computed from.
    pub dial_version: u64,
}

impl MeasurementUnit {
    /// Rebuild the cache and prediction from every record.
    pub fn full_reconfigure(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<PassStats> {
        self.validity = CacheValidity::Empty;
        self.reset_prediction();

        let prediction = &mut self.prediction;
        let modes = &mut self.mode_stack;
        self.cache.build_with(self.source.as_ref(), self.predicate.as_ref(), |entry, record| {
            let weight = engine.calc_weight(record, dials) * record.input_weight;
            let v = &entry.values;
            prediction.fill(v.x, v.y, v.z, weight);
            modes.fill(v.mode, v.x, v.y, v.z, weight);
        })?;
        self.validity = CacheValidity::Full;

        self.convert_event_rates(dials);
        Ok(self.finish_pass(ReconfigureMode::Full, self.cache.n_scanned(), dials))
    }

    /// Refill the prediction from cached signal records.
    ///
    /// Runs a full pass instead when the cache is [`CacheValidity::Empty`].
    pub fn fast_reconfigure(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<PassStats> {
        if self.validity != CacheValidity::Full {
            log::debug!("sample {}: cache empty, running full pass", self.name);
            return self.full_reconfigure(engine, dials);
        }

        self.reset_prediction();
        for entry in self.cache.entries() {
            let record = self.source.record(entry.index).ok_or_else(|| {
                Error::Validation(format!(
                    "sample '{}': cached index {} out of range for {} records",
                    self.name,
                    entry.index,
                    self.source.count()
                ))
            })?;
            let weight = engine.calc_weight(&record, dials) * record.input_weight;
            let v = &entry.values;
            self.prediction.fill(v.x, v.y, v.z, weight);
            self.mode_stack.fill(v.mode, v.x, v.y, v.z, weight);
        }

        self.convert_event_rates(dials);
        Ok(self.finish_pass(ReconfigureMode::Fast, self.cache.len(), dials))
    }

    fn reset_prediction(&mut self) {
        self.prediction.reset();
        self.mode_stack.reset();
        self.rates_converted = false;
    }

    /// Scale raw weighted sums to the reported quantity, then normalise.
    ///
    /// The scaling runs once per filled prediction; later calls only
    /// re-apply the normalisation.
    fn convert_event_rates(&mut self, dials: &DialState) {
        if !self.rates_converted {
            if self.options.scale == ScaleMode::XSec {
                self.prediction.scale(self.scale_factor);
                self.prediction.divide_by_bin_width();
                self.mode_stack.scale(self.scale_factor);
                self.mode_stack.divide_by_bin_width();
            }
            if self.options.norm_state == NormState::Shape {
                let target = self.data.integral();
                let current = self.prediction.integral();
                if current != 0.0 {
                    self.prediction.scale(target / current);
                    self.mode_stack.scale(target / current);
                }
            }
            self.rates_converted = true;
        }
        let norm = self.norm_from(dials);
        self.apply_norm_scale(norm);
    }

    /// Set the prediction normalisation to `norm`, replacing the previous one.
    pub fn apply_norm_scale(&mut self, norm: f64) {
        self.current_norm = norm;
        self.prediction.set_norm(norm);
        self.mode_stack.set_norm(norm);
    }

    /// Re-apply the normalisation after a norm-dial change, without a pass.
    ///
    /// Falls back to a fast pass (and so to a full pass) when nothing has
    /// been filled yet.
    pub fn renormalise(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<()> {
        if self.validity != CacheValidity::Full {
            self.fast_reconfigure(engine, dials)?;
            return Ok(());
        }
        let norm = self.norm_from(dials);
        self.apply_norm_scale(norm);
        Ok(())
    }

    /// Normalisation implied by `dials`: the `<name>_norm` dial if set,
    /// otherwise the configured value.
    pub fn norm_from(&self, dials: &DialState) -> f64 {
        dials.get(&self.norm_dial_name()).unwrap_or(self.configured_norm)
    }

    fn finish_pass(&mut self, mode: ReconfigureMode, scanned: usize, dials: &DialState) -> PassStats {
        let stats = PassStats {
            mode,
            n_events_scanned: scanned,
            n_signal: self.cache.len(),
            dial_version: dials.version(),
        };
        log::debug!(
            "sample {}: {:?} pass, {} scanned, {} signal, dials v{}, integral {:.6e}",
            self.name,
            mode,
            stats.n_events_scanned,
            stats.n_signal,
            stats.dial_version,
            self.prediction.integral()
        );
        self.last_pass = Some(stats);
        stats
    }
}

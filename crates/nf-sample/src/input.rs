//! Event sources: in-memory records and concatenated (joint) inputs.

use std::borrow::Cow;
use std::path::Path;

use nf_core::{Error, EventSource, InteractionRecord, Result};
use nf_hist::Histogram;
use serde::{Deserialize, Serialize};

/// On-disk layout of an event file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFile {
    /// Neutrino flux used for generation (MeV binning).
    #[serde(default)]
    pub flux: Option<Histogram>,
    /// Generated event-rate histogram (MeV binning).
    #[serde(default)]
    pub event_rate: Option<Histogram>,
    /// Interaction records.
    pub events: Vec<InteractionRecord>,
}

/// Records held in memory, optionally with flux and event-rate histograms.
#[derive(Debug, Clone, Default)]
pub struct VecEventSource {
    label: String,
    records: Vec<InteractionRecord>,
    flux: Option<Histogram>,
    event_rate: Option<Histogram>,
}

impl VecEventSource {
    /// Source without flux information.
    pub fn new(records: Vec<InteractionRecord>) -> Self {
        Self { label: "events".into(), records, flux: None, event_rate: None }
    }

    /// Attach flux and event-rate histograms.
    pub fn with_histograms(mut self, flux: Histogram, event_rate: Histogram) -> Self {
        self.flux = Some(flux);
        self.event_rate = Some(event_rate);
        self
    }

    /// Set the label used in logs.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Build from a parsed [`EventFile`].
    pub fn from_event_file(file: EventFile) -> Self {
        Self { label: "events".into(), records: file.events, flux: file.flux, event_rate: file.event_rate }
    }

    /// Read an [`EventFile`] from JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let file: EventFile = serde_json::from_str(&text)?;
        log::debug!("read {} events from {}", file.events.len(), path.display());
        Ok(Self::from_event_file(file).with_label(path.display().to_string()))
    }

    /// Borrow the records.
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }
}

impl EventSource for VecEventSource {
    fn count(&self) -> usize {
        self.records.len()
    }

    fn record(&self, index: usize) -> Option<Cow<'_, InteractionRecord>> {
        self.records.get(index).map(Cow::Borrowed)
    }

    fn flux_integral(&self, enu_min: f64, enu_max: f64) -> Option<f64> {
        let flux = self.flux.as_ref()?;
        if enu_min >= enu_max {
            return Some(flux.integral(true));
        }
        Some(flux.integral_range(enu_min, enu_max, true))
    }

    fn event_rate_integral(&self) -> Option<f64> {
        self.event_rate.as_ref().map(|h| h.integral(true))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Several inputs concatenated into one index space.
///
/// Input `i` occupies the half-open index range `[low_i, high_i)`, with
/// `high_i = low_{i+1}`. Its records' input weights are multiplied by
///
/// `scale_i = (N_total / Σ_j R_j) · R_i / n_i`
///
/// where `R` is each input's event-rate integral and `n` its record count,
/// so every input contributes in proportion to its generated rate.
pub struct JointEventSource {
    label: String,
    inputs: Vec<Box<dyn EventSource>>,
    low: Vec<usize>,
    total: usize,
    scales: Vec<f64>,
}

impl JointEventSource {
    /// Concatenate `inputs`. Every input must provide an event-rate integral.
    pub fn new(inputs: Vec<Box<dyn EventSource>>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::Validation("joint input needs at least one source".into()));
        }

        let mut low = Vec::with_capacity(inputs.len());
        let mut total = 0usize;
        let mut rates = Vec::with_capacity(inputs.len());
        for input in &inputs {
            low.push(total);
            total += input.count();
            let rate = input.event_rate_integral().ok_or_else(|| {
                Error::Validation(format!(
                    "joint input '{}' has no event-rate histogram",
                    input.label()
                ))
            })?;
            rates.push(rate);
        }

        let rate_sum: f64 = rates.iter().sum();
        if rate_sum.is_nan() || rate_sum <= 0.0 {
            return Err(Error::Validation("joint inputs have zero total event rate".into()));
        }

        let scales = inputs
            .iter()
            .zip(&rates)
            .map(|(input, rate)| {
                let n = input.count();
                if n == 0 { 0.0 } else { (total as f64 / rate_sum) * rate / n as f64 }
            })
            .collect::<Vec<_>>();

        let label = inputs.iter().map(|i| i.label()).collect::<Vec<_>>().join(";");
        log::debug!("joint input '{label}': {total} records, scales {scales:?}");

        Ok(Self { label, inputs, low, total, scales })
    }

    /// Number of concatenated inputs.
    pub fn n_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Per-input weight scales.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// `[low, high)` index range of input `i`.
    pub fn segment_bounds(&self, i: usize) -> (usize, usize) {
        let high = self.low.get(i + 1).copied().unwrap_or(self.total);
        (self.low[i], high)
    }

    /// Input that owns global `index`, `None` past the end.
    pub fn segment_of(&self, index: usize) -> Option<usize> {
        if index >= self.total {
            return None;
        }
        // Last segment whose lower bound is <= index; empty segments share
        // their lower bound with the next one and are skipped.
        Some(self.low.partition_point(|&lo| lo <= index) - 1)
    }
}

impl EventSource for JointEventSource {
    fn count(&self) -> usize {
        self.total
    }

    fn record(&self, index: usize) -> Option<Cow<'_, InteractionRecord>> {
        let seg = self.segment_of(index)?;
        let local = self.inputs[seg].record(index - self.low[seg])?;
        let mut record = local.into_owned();
        record.input_weight *= self.scales[seg];
        Some(Cow::Owned(record))
    }

    fn flux_integral(&self, enu_min: f64, enu_max: f64) -> Option<f64> {
        self.inputs.iter().map(|i| i.flux_integral(enu_min, enu_max)).sum()
    }

    fn event_rate_integral(&self) -> Option<f64> {
        self.inputs.iter().map(|i| i.event_rate_integral()).sum()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

//! Measurement unit: one sample compared against one measured distribution.

use std::collections::BTreeMap;
use std::sync::Arc;

use nf_core::{ConfigKey, Error, EventSource, Result, SignalPredicate};
use nf_hist::{HistogramAccumulator, HistogramSnapshot, ModeStack};
use serde::Serialize;

use crate::cache::SignalEventCache;
use crate::data::{Covariance, MeasuredData};
use crate::likelihood::{self, Statistic};
use crate::options::{NormState, SampleOptions, ScaleMode};
use crate::reconfigure::{CacheValidity, PassStats};
use crate::registry::{self, ChannelInfo};

/// Cross-section unit applied to the event-rate integral.
const XSEC_UNIT: f64 = 1.0e-38;

/// A sample: events, signal definition, prediction and data.
///
/// Construction fixes the event source and predicate. The signal cache starts
/// [`CacheValidity::Empty`]; the first pass over the events fills it.
pub struct MeasurementUnit {
    pub(crate) name: String,
    pub(crate) info: ChannelInfo,
    pub(crate) options: SampleOptions,
    pub(crate) source: Arc<dyn EventSource>,
    pub(crate) predicate: Box<dyn SignalPredicate>,
    pub(crate) prediction: HistogramAccumulator,
    pub(crate) mode_stack: ModeStack,
    /// Set once the current prediction has been scaled to the reported quantity.
    pub(crate) rates_converted: bool,
    pub(crate) measured: MeasuredData,
    pub(crate) data: MeasuredData,
    pub(crate) covariance: Option<Covariance>,
    pub(crate) statistic: Statistic,
    pub(crate) scale_factor: f64,
    pub(crate) configured_norm: f64,
    pub(crate) current_norm: f64,
    pub(crate) cache: SignalEventCache,
    pub(crate) validity: CacheValidity,
    pub(crate) last_pass: Option<PassStats>,
}

/// Per-unit numbers for reports.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    /// Sample name.
    pub name: String,
    /// Statistic value.
    pub value: f64,
    /// `chi2` or `poisson`.
    pub statistic: &'static str,
    /// Degrees of freedom.
    pub ndof: usize,
    /// Upper-tail probability of `value`.
    pub p_value: Option<f64>,
    /// Normalisation currently applied.
    pub norm: f64,
    /// Cached signal records.
    pub n_signal: usize,
    /// Prediction histogram.
    pub prediction: HistogramSnapshot,
    /// Prediction split by interaction mode.
    pub modes: BTreeMap<i32, HistogramSnapshot>,
    /// Data values compared against.
    pub data: Vec<f64>,
}

impl MeasurementUnit {
    /// Build a unit from a configuration key.
    ///
    /// Reads `name` (required), `type` (default `DEFAULT`) and `norm`
    /// (default 1.0). The name selects the channel from the registry.
    pub fn from_key(key: &ConfigKey, source: Arc<dyn EventSource>, data: MeasuredData) -> Result<Self> {
        let name = key.require_str("name")?;
        let (info, predicate) = registry::create_predicate(name)?;
        let type_str = key.get_str("type").unwrap_or("DEFAULT");
        let options = SampleOptions::parse(name, type_str, info.default_type, info.allowed_types)?;
        let norm = key.get_f64_or("norm", 1.0)?;
        Self::new(info, predicate, options, norm, source, data)
    }

    /// Build a unit from explicit parts.
    pub fn new(
        info: ChannelInfo,
        predicate: Box<dyn SignalPredicate>,
        options: SampleOptions,
        norm: f64,
        source: Arc<dyn EventSource>,
        data: MeasuredData,
    ) -> Result<Self> {
        let name = info.name.to_string();
        data.validate(&name)?;
        if data.dimension() != info.dimension {
            return Err(Error::Validation(format!(
                "sample '{name}': {}D data for a {}D channel",
                data.dimension(),
                info.dimension
            )));
        }
        if !norm.is_finite() {
            return Err(Error::Validation(format!("sample '{name}': non-finite norm {norm}")));
        }

        let prediction = match &data.y_edges {
            Some(y) => HistogramAccumulator::new_2d(format!("{name}_MC"), data.x_edges.clone(), y.clone()),
            None => HistogramAccumulator::new_1d(format!("{name}_MC"), data.x_edges.clone()),
        };

        let mode_stack = ModeStack::new(&prediction);

        let statistic = match options.scale {
            ScaleMode::Events => Statistic::Poisson,
            ScaleMode::XSec => Statistic::Chi2,
        };
        let covariance = match statistic {
            Statistic::Chi2 => Some(Covariance::new(&name, data.covariance_matrix(), options.covariance)?),
            Statistic::Poisson => None,
        };

        let scale_factor = scale_factor(&info, options.scale, source.as_ref());
        log::info!(
            "sample {name}: {} events from {}, scale factor {scale_factor:e}",
            source.count(),
            source.label()
        );

        Ok(Self {
            name,
            info,
            options,
            source,
            predicate,
            prediction,
            mode_stack,
            rates_converted: false,
            measured: data.clone(),
            data,
            covariance,
            statistic,
            scale_factor,
            configured_norm: norm,
            current_norm: 1.0,
            cache: SignalEventCache::new(),
            validity: CacheValidity::Empty,
            last_pass: None,
        })
    }

    /// Sample name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel metadata.
    pub fn info(&self) -> &ChannelInfo {
        &self.info
    }

    /// Parsed type options.
    pub fn options(&self) -> &SampleOptions {
        &self.options
    }

    /// Name of the dial controlling this unit's normalisation.
    pub fn norm_dial_name(&self) -> String {
        format!("{}_norm", self.name)
    }

    /// Event source.
    pub fn source(&self) -> &dyn EventSource {
        self.source.as_ref()
    }

    /// Prediction histogram (normalisation applied on read).
    pub fn prediction(&self) -> &HistogramAccumulator {
        &self.prediction
    }

    /// Prediction split by interaction mode; the layers sum to [`Self::prediction`].
    pub fn mode_stack(&self) -> &ModeStack {
        &self.mode_stack
    }

    /// Data currently compared against (measured or fake).
    pub fn data(&self) -> &MeasuredData {
        &self.data
    }

    /// Data as loaded at construction.
    pub fn measured_data(&self) -> &MeasuredData {
        &self.measured
    }

    /// Covariance for χ² samples.
    pub fn covariance(&self) -> Option<&Covariance> {
        self.covariance.as_ref()
    }

    /// Statistic this unit contributes.
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    /// Signal cache from the last full pass.
    pub fn cache(&self) -> &SignalEventCache {
        &self.cache
    }

    /// Whether the cache can serve a fast pass.
    pub fn validity(&self) -> CacheValidity {
        self.validity
    }

    /// Scale applied to raw weighted sums before bin-width division.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Normalisation from the configuration key.
    pub fn configured_norm(&self) -> f64 {
        self.configured_norm
    }

    /// Normalisation currently applied to the prediction.
    pub fn current_norm(&self) -> f64 {
        self.current_norm
    }

    /// Statistics of the most recent pass.
    pub fn last_pass(&self) -> Option<&PassStats> {
        self.last_pass.as_ref()
    }

    /// Drop the signal cache; the next pass is a full pass.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
        self.validity = CacheValidity::Empty;
    }

    /// Statistic value for the current prediction and data.
    pub fn likelihood(&self) -> f64 {
        let prediction = self.prediction.contents();
        let mut value = match (&self.statistic, &self.covariance) {
            (Statistic::Chi2, Some(cov)) => {
                likelihood::chi2_quadratic(&prediction, &self.data.values, cov.inverse())
            }
            _ => likelihood::poisson_llr(&prediction, &self.data.values),
        };
        if self.options.norm_penalty {
            value += likelihood::norm_penalty(self.current_norm, self.info.norm_error);
        }
        value
    }

    /// Degrees of freedom: number of bins, one fewer for shape-only samples.
    pub fn ndof(&self) -> usize {
        let n = self.data.n_bins();
        if self.options.norm_state == NormState::Shape { n.saturating_sub(1) } else { n }
    }

    /// Replace the compared data with `values` (same binning).
    pub fn set_fake_data(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.data.n_bins() {
            return Err(Error::Validation(format!(
                "sample '{}': fake data has {} bins, expected {}",
                self.name,
                values.len(),
                self.data.n_bins()
            )));
        }
        self.data.values = values;
        Ok(())
    }

    /// Use the current prediction as data.
    pub fn set_fake_data_from_prediction(&mut self) {
        self.data.values = self.prediction.contents();
    }

    /// Restore the measured data.
    pub fn reset_data(&mut self) {
        self.data = self.measured.clone();
    }

    /// Report entry for this unit.
    pub fn summary(&self) -> UnitSummary {
        let value = self.likelihood();
        let ndof = self.ndof();
        UnitSummary {
            name: self.name.clone(),
            value,
            statistic: match self.statistic {
                Statistic::Chi2 => "chi2",
                Statistic::Poisson => "poisson",
            },
            ndof,
            p_value: likelihood::chi2_pvalue(value, ndof),
            norm: self.current_norm,
            n_signal: self.cache.len(),
            prediction: self.prediction.snapshot(),
            modes: self.mode_stack.snapshot(),
            data: self.data.values.clone(),
        }
    }
}

/// Scale from weighted sums to the reported quantity.
///
/// Cross sections use the generated event rate over the flux integral in the
/// channel's energy window, falling back to `1/N` when the source carries no
/// flux information. Event-count samples are not scaled.
fn scale_factor(info: &ChannelInfo, mode: ScaleMode, source: &dyn EventSource) -> f64 {
    if mode == ScaleMode::Events {
        return 1.0;
    }
    let n = source.count().max(1) as f64;
    let (emin, emax) = info.enu_range;
    match (source.event_rate_integral(), source.flux_integral(emin, emax)) {
        (Some(rate), Some(flux)) if flux > 0.0 => rate * XSEC_UNIT / n / flux * info.scale_multiplier,
        _ => {
            log::warn!("sample {}: no flux information, scaling by 1/N", info.name);
            1.0 / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::VecEventSource;
    use nf_core::{FourMomentum, InteractionRecord, Particle, ParticleState};
    use nf_hist::{Axis, Histogram};

    fn t2k_event(pmu: f64) -> InteractionRecord {
        let fs = |pdg: i32, pz: f64, m: f64| {
            Particle::new(pdg, ParticleState::FinalState, FourMomentum::new(0.0, 0.0, pz, (pz * pz + m * m).sqrt()))
        };
        InteractionRecord::new(11, vec![
            Particle::new(14, ParticleState::Initial, FourMomentum::new(0.0, 0.0, 1000.0, 1000.0)),
            fs(13, pmu, 105.658),
            fs(211, 200.0, 139.57),
        ])
    }

    fn t2k_data() -> MeasuredData {
        MeasuredData::new_1d(Axis::new(vec![0.0, 0.5, 1.0]).unwrap(), vec![1.0, 1.0]).with_errors(vec![0.5, 0.5])
    }

    fn key() -> ConfigKey {
        ConfigKey::new().with("name", "T2K_CC1pip_H2O_XSec_1Dpmu_nu")
    }

    #[test]
    fn from_key_picks_channel_and_options() {
        let src = Arc::new(VecEventSource::new(vec![t2k_event(300.0)]));
        let unit = MeasurementUnit::from_key(&key().with("type", "FREE/DIAG"), src, t2k_data()).unwrap();
        assert_eq!(unit.name(), "T2K_CC1pip_H2O_XSec_1Dpmu_nu");
        assert!(unit.options().is_free());
        assert_eq!(unit.statistic(), Statistic::Chi2);
        assert_eq!(unit.validity(), CacheValidity::Empty);
        assert_eq!(unit.scale_factor(), 1.0);
        assert_eq!(unit.norm_dial_name(), "T2K_CC1pip_H2O_XSec_1Dpmu_nu_norm");
    }

    #[test]
    fn unknown_sample_fails_construction() {
        let src = Arc::new(VecEventSource::new(vec![]));
        let k = ConfigKey::new().with("name", "Bogus");
        assert!(matches!(MeasurementUnit::from_key(&k, src, t2k_data()), Err(Error::UnknownSample(_))));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let src = Arc::new(VecEventSource::new(vec![]));
        let k = ConfigKey::new().with("name", "MiniBooNE_CCQE_XSec_2DTcos_nu");
        assert!(MeasurementUnit::from_key(&k, src, t2k_data()).is_err());
    }

    #[test]
    fn singular_covariance_is_fatal() {
        let src = Arc::new(VecEventSource::new(vec![]));
        let data = MeasuredData::new_1d(Axis::new(vec![0.0, 0.5, 1.0]).unwrap(), vec![1.0, 1.0])
            .with_covariance(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let err = MeasurementUnit::from_key(&key(), src, data).err().unwrap();
        assert!(matches!(err, Error::SingularCovariance(_)));
    }

    #[test]
    fn flux_scale_factor() {
        let h = |v: f64| Histogram::from_parts("h", Axis::new(vec![0.0, 2000.0]).unwrap(), vec![v]).unwrap();
        let src = VecEventSource::new(vec![t2k_event(300.0), t2k_event(700.0)]).with_histograms(h(2.0), h(5.0));
        let unit = MeasurementUnit::from_key(&key(), Arc::new(src), t2k_data()).unwrap();
        // rate 10000, flux 4000, N 2
        approx::assert_relative_eq!(unit.scale_factor(), 10000.0 * 1e-38 / 2.0 / 4000.0);
    }

    #[test]
    fn flux_window_outside_axis_falls_back_to_one_over_n() {
        let h = |v: f64| Histogram::from_parts("h", Axis::new(vec![0.0, 2000.0]).unwrap(), vec![v]).unwrap();
        let src = VecEventSource::new(vec![t2k_event(300.0), t2k_event(700.0)]).with_histograms(h(2.0), h(5.0));
        let (info, predicate) = registry::create_predicate("T2K_CC1pip_H2O_XSec_1Dpmu_nu").unwrap();
        let info = ChannelInfo { enu_range: (5000.0, 6000.0), ..info };
        let options = SampleOptions::parse(info.name, "DEFAULT", info.default_type, info.allowed_types).unwrap();
        let unit = MeasurementUnit::new(info, predicate, options, 1.0, Arc::new(src), t2k_data()).unwrap();
        assert_eq!(unit.scale_factor(), 0.5);
    }

    #[test]
    fn fake_data_length_checked_and_reset() {
        let src = Arc::new(VecEventSource::new(vec![]));
        let mut unit = MeasurementUnit::from_key(&key(), src, t2k_data()).unwrap();
        assert!(unit.set_fake_data(vec![1.0]).is_err());
        unit.set_fake_data(vec![3.0, 4.0]).unwrap();
        assert_eq!(unit.data().values, vec![3.0, 4.0]);
        unit.reset_data();
        assert_eq!(unit.data().values, vec![1.0, 1.0]);
    }
}

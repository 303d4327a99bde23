//! Behavioural properties of the reconfiguration passes.

use std::sync::Arc;

use approx::assert_relative_eq;
use nf_core::{DialState, FourMomentum, InteractionRecord, Particle, ParticleState, ProjectionValues, SignalPredicate};
use nf_hist::{Axis, Histogram};
use nf_sample::{
    CacheValidity, ChannelInfo, MeasuredData, MeasurementUnit, ReconfigureMode, SampleOptions, ScaleMode,
    VecEventSource,
};

/// Signal when the mode is listed; projects onto the mode itself.
struct ModeList(Vec<i32>);

impl SignalPredicate for ModeList {
    fn name(&self) -> &str {
        "mode_list"
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        ProjectionValues { x: record.mode as f64 + 0.5, y: 0.5, ..ProjectionValues::for_mode(record.mode) }
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        self.0.contains(&record.mode)
    }
}

const COUNTS: ChannelInfo = ChannelInfo {
    name: "counts",
    dimension: 1,
    enu_range: (0.0, 0.0),
    default_type: "EVT",
    allowed_types: &["EVT"],
    norm_error: 0.0,
    scale_multiplier: 1.0,
    title: "mode; events",
};

fn records(n: i32) -> Vec<InteractionRecord> {
    (0..n)
        .map(|i| {
            let nu = Particle::new(14, ParticleState::Initial, FourMomentum::new(0.0, 0.0, 500.0 + 100.0 * i as f64, 500.0 + 100.0 * i as f64));
            InteractionRecord::new(i, vec![nu]).with_input_weight(1.0 + 0.1 * i as f64)
        })
        .collect()
}

fn counting_unit(n: i32, signal: Vec<i32>) -> MeasurementUnit {
    let data = MeasuredData::new_1d(Axis::uniform(10, 0.0, 10.0).unwrap(), vec![1.0; 10]);
    let options = SampleOptions { scale: ScaleMode::Events, ..SampleOptions::default() };
    let source: Vec<InteractionRecord> = records(n).into_iter().map(|r| r.with_input_weight(1.0)).collect();
    MeasurementUnit::new(COUNTS, Box::new(ModeList(signal)), options, 1.0, Arc::new(VecEventSource::new(source)), data)
        .unwrap()
}

/// Weight depends on the record energy and two dials.
fn engine(record: &InteractionRecord, dials: &DialState) -> f64 {
    let enu = record.enu() / 1000.0;
    (1.0 + dials.get_or("a", 0.0) * enu) * (1.0 + dials.get_or("b", 0.0) * (record.mode % 3) as f64)
}

fn xsec_unit_2d() -> MeasurementUnit {
    const INFO: ChannelInfo = ChannelInfo {
        name: "xsec2d",
        dimension: 2,
        enu_range: (600.0, 1200.0),
        default_type: "FIX/FULL",
        allowed_types: &["FIX", "FREE", "FULL", "DIAG"],
        norm_error: 0.1,
        scale_multiplier: 1.0,
        title: "",
    };
    let flux = Histogram::from_parts("flux", Axis::uniform(20, 0.0, 2000.0).unwrap(), vec![1.0; 20]).unwrap();
    let rate = Histogram::from_parts("rate", Axis::uniform(20, 0.0, 2000.0).unwrap(), vec![0.5; 20]).unwrap();
    let source = VecEventSource::new(records(12)).with_histograms(flux, rate);
    let data = MeasuredData::new_2d(
        Axis::new(vec![0.0, 2.0, 5.0, 12.0]).unwrap(),
        Axis::new(vec![0.0, 1.0]).unwrap(),
        vec![1.0, 2.0, 3.0],
    )
    .with_errors(vec![0.5, 0.5, 0.5]);
    MeasurementUnit::new(INFO, Box::new(ModeList(vec![0, 2, 3, 5, 8, 11])), SampleOptions::default(), 1.0, Arc::new(source), data)
        .unwrap()
}

#[test]
fn fast_pass_matches_full_pass_for_any_dials() {
    let mut fast = xsec_unit_2d();
    let mut full = xsec_unit_2d();
    let mut dials = DialState::new();
    fast.full_reconfigure(&engine, &dials).unwrap();

    for (a, b) in [(0.0, 0.0), (0.3, -0.2), (-0.9, 1.5), (2.0, 0.0), (0.0, -1.0)] {
        dials.set("a", a);
        dials.set("b", b);
        let fs = fast.fast_reconfigure(&engine, &dials).unwrap();
        let ls = full.full_reconfigure(&engine, &dials).unwrap();
        assert_eq!(fs.mode, ReconfigureMode::Fast);
        assert_eq!(ls.mode, ReconfigureMode::Full);
        assert_eq!(fs.dial_version, ls.dial_version);
        assert_eq!(fast.prediction().contents(), full.prediction().contents());
        assert_eq!(fast.prediction().errors(), full.prediction().errors());
        assert_relative_eq!(fast.likelihood(), full.likelihood());

        let (fm, lm) = (fast.mode_stack(), full.mode_stack());
        assert_eq!(fm.modes().collect::<Vec<_>>(), vec![0, 2, 3, 5, 8, 11]);
        assert_eq!(fm.modes().collect::<Vec<_>>(), lm.modes().collect::<Vec<_>>());
        for mode in fm.modes() {
            assert_eq!(fm.get(mode).unwrap().contents(), lm.get(mode).unwrap().contents());
        }
        for (stacked, total) in fm.total().iter().zip(fast.prediction().contents()) {
            assert_relative_eq!(*stacked, total, max_relative = 1e-12);
        }
    }
}

#[test]
fn consecutive_full_passes_are_identical() {
    let mut unit = xsec_unit_2d();
    let mut dials = DialState::new();
    dials.set("a", 0.4);
    unit.full_reconfigure(&engine, &dials).unwrap();
    let first = unit.prediction().snapshot();
    let entries = unit.cache().entries().to_vec();
    unit.full_reconfigure(&engine, &dials).unwrap();
    assert_eq!(unit.prediction().snapshot().contents, first.contents);
    assert_eq!(unit.cache().entries(), entries.as_slice());
}

#[test]
fn cache_holds_signal_in_index_order() {
    let mut unit = counting_unit(10, vec![7, 3, 1, 4]);
    let stats = unit.full_reconfigure(&engine, &DialState::new()).unwrap();
    assert_eq!(stats.n_signal, 4);
    assert_eq!(stats.n_events_scanned, 10);
    assert_eq!(unit.cache().indices().collect::<Vec<_>>(), vec![1, 3, 4, 7]);
    assert_eq!(unit.validity(), CacheValidity::Full);
}

#[test]
fn norm_scale_is_linear_and_replaces() {
    let mut unit = counting_unit(10, vec![1, 3, 4, 7]);
    unit.full_reconfigure(&engine, &DialState::new()).unwrap();
    let base = unit.prediction().integral();
    for k in [0.5, 1.0, 2.0] {
        unit.apply_norm_scale(k);
        assert_relative_eq!(unit.prediction().integral(), k * base);
    }
    unit.apply_norm_scale(0.5);
    unit.apply_norm_scale(2.0);
    assert_relative_eq!(unit.prediction().integral(), 2.0 * base);
}

#[test]
fn worked_scenario_two_then_three() {
    let mut unit = counting_unit(10, vec![1, 3, 4, 7]);
    let weight = |_: &InteractionRecord, d: &DialState| d.get_or("w", 2.0);

    let mut dials = DialState::new();
    unit.full_reconfigure(&weight, &dials).unwrap();
    assert_relative_eq!(unit.prediction().integral(), 8.0);

    dials.set("w", 3.0);
    let stats = unit.fast_reconfigure(&weight, &dials).unwrap();
    assert_eq!(stats.mode, ReconfigureMode::Fast);
    assert_eq!(stats.n_events_scanned, 4);
    assert_relative_eq!(unit.prediction().integral(), 12.0);

    let mut reference = counting_unit(10, vec![1, 3, 4, 7]);
    reference.full_reconfigure(&weight, &dials).unwrap();
    assert_eq!(unit.prediction().contents(), reference.prediction().contents());
}

#[test]
fn non_finite_weights_reach_the_bins() {
    let mut unit = counting_unit(4, vec![2]);
    let nan = |_: &InteractionRecord, _: &DialState| f64::NAN;
    unit.full_reconfigure(&nan, &DialState::new()).unwrap();
    assert!(unit.prediction().bin_content(2).is_nan());
    assert_eq!(unit.prediction().bin_content(0), 0.0);
}

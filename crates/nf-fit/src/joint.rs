//! Joint comparison: several measurement units summed into one statistic.

use std::collections::BTreeMap;
use std::path::Path;

use nf_core::{DialState, Error, Result, ReweightEngine};
use nf_sample::likelihood::chi2_pvalue;
use nf_sample::{MeasurementUnit, PassStats, UnitSummary};
use rayon::prelude::*;
use serde::Serialize;

/// Replacement data for [`JointComparison::set_fake_data`].
#[derive(Debug, Clone, PartialEq)]
pub enum FakeData {
    /// Every unit's data becomes its current prediction.
    Mc,
    /// Values per unit name.
    External(BTreeMap<String, Vec<f64>>),
}

impl FakeData {
    /// Read `{ "<unit name>": [values...] }` from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::External(serde_json::from_str(&text)?))
    }
}

/// Joint statistic with its per-unit breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct JointSummary {
    /// Sum of unit statistics.
    pub likelihood: f64,
    /// Sum of unit degrees of freedom.
    pub ndof: usize,
    /// Upper-tail probability of `likelihood`.
    pub p_value: Option<f64>,
    /// Units in configuration order.
    pub units: Vec<UnitSummary>,
}

/// Ordered collection of measurement units compared together.
///
/// Units are independent: each has its own cache, normalisation and data.
#[derive(Default)]
pub struct JointComparison {
    units: Vec<MeasurementUnit>,
    parallel: bool,
}

impl JointComparison {
    /// Compare `units`, processed sequentially. Names must be unique.
    pub fn new(units: Vec<MeasurementUnit>) -> Result<Self> {
        let mut joint = Self::default();
        for unit in units {
            joint.add_unit(unit)?;
        }
        Ok(joint)
    }

    /// Process units in parallel (rayon) during passes.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Append a unit. Names must be unique.
    pub fn add_unit(&mut self, unit: MeasurementUnit) -> Result<()> {
        if self.unit(unit.name()).is_some() {
            return Err(Error::Validation(format!("sample '{}' added twice", unit.name())));
        }
        self.units.push(unit);
        Ok(())
    }

    /// Units in order.
    pub fn units(&self) -> &[MeasurementUnit] {
        &self.units
    }

    /// Unit by name.
    pub fn unit(&self, name: &str) -> Option<&MeasurementUnit> {
        self.units.iter().find(|u| u.name() == name)
    }

    /// Mutable unit by name.
    pub fn unit_mut(&mut self, name: &str) -> Option<&mut MeasurementUnit> {
        self.units.iter_mut().find(|u| u.name() == name)
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Bring every unit up to date with `dials`.
    ///
    /// Units with an empty cache get a full pass, the rest a fast pass.
    pub fn reconfigure_all(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<Vec<PassStats>> {
        self.each_unit(|u| u.fast_reconfigure(engine, dials))
    }

    /// Full pass on every unit, rebuilding all caches.
    pub fn reconfigure_all_full(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<Vec<PassStats>> {
        self.each_unit(|u| u.full_reconfigure(engine, dials))
    }

    /// Re-apply unit normalisations from `dials` without re-weighting.
    pub fn renormalise_all(&mut self, engine: &dyn ReweightEngine, dials: &DialState) -> Result<()> {
        self.each_unit(|u| u.renormalise(engine, dials)).map(|_| ())
    }

    fn each_unit<T, F>(&mut self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&mut MeasurementUnit) -> Result<T> + Send + Sync,
    {
        if self.parallel {
            self.units.par_iter_mut().map(f).collect()
        } else {
            self.units.iter_mut().map(f).collect()
        }
    }

    /// Sum of unit statistics.
    pub fn likelihood(&self) -> f64 {
        self.units.iter().map(MeasurementUnit::likelihood).sum()
    }

    /// Replace unit data.
    ///
    /// External data is checked for every unit before any unit is changed.
    pub fn set_fake_data(&mut self, fake: FakeData) -> Result<()> {
        match fake {
            FakeData::Mc => {
                for unit in &mut self.units {
                    unit.set_fake_data_from_prediction();
                }
                log::info!("set fake data from MC for {} samples", self.units.len());
            }
            FakeData::External(mut values) => {
                for (name, v) in &values {
                    let unit = self
                        .unit(name)
                        .ok_or_else(|| Error::Validation(format!("fake data for unknown sample '{name}'")))?;
                    if v.len() != unit.data().n_bins() {
                        return Err(Error::Validation(format!(
                            "fake data for '{name}' has {} bins, expected {}",
                            v.len(),
                            unit.data().n_bins()
                        )));
                    }
                }
                for unit in &mut self.units {
                    if let Some(v) = values.remove(unit.name()) {
                        unit.set_fake_data(v)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Restore measured data on every unit.
    pub fn reset_data(&mut self) {
        self.units.iter_mut().for_each(MeasurementUnit::reset_data);
    }

    /// Joint and per-unit statistics.
    pub fn summary(&self) -> JointSummary {
        let units: Vec<UnitSummary> = self.units.iter().map(MeasurementUnit::summary).collect();
        let likelihood: f64 = units.iter().map(|u| u.value).sum();
        let ndof: usize = units.iter().map(|u| u.ndof).sum();
        JointSummary { likelihood, ndof, p_value: chi2_pvalue(likelihood, ndof), units }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};
    use nf_hist::Axis;
    use nf_sample::{ChannelInfo, MeasuredData, ReconfigureMode, SampleOptions, ScaleMode, VecEventSource};

    struct Even;

    impl SignalPredicate for Even {
        fn name(&self) -> &str {
            "even"
        }

        fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
            ProjectionValues { x: (record.mode % 4) as f64 + 0.5, ..ProjectionValues::for_mode(record.mode) }
        }

        fn is_signal(&self, record: &InteractionRecord) -> bool {
            record.mode % 2 == 0
        }
    }

    fn unit(name: &'static str) -> MeasurementUnit {
        let info = ChannelInfo {
            name,
            dimension: 1,
            enu_range: (0.0, 0.0),
            default_type: "EVT",
            allowed_types: &["EVT"],
            norm_error: 0.0,
            scale_multiplier: 1.0,
            title: "",
        };
        let records = (0..20).map(|i| InteractionRecord::new(i, vec![])).collect();
        let data = MeasuredData::new_1d(Axis::uniform(4, 0.0, 4.0).unwrap(), vec![3.0, 1.0, 4.0, 1.0]);
        let opts = SampleOptions { scale: ScaleMode::Events, ..SampleOptions::default() };
        MeasurementUnit::new(info, Box::new(Even), opts, 1.0, Arc::new(VecEventSource::new(records)), data).unwrap()
    }

    fn one(_: &InteractionRecord, _: &DialState) -> f64 {
        1.0
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut joint = JointComparison::new(vec![unit("a")]).unwrap();
        assert!(joint.add_unit(unit("a")).is_err());
        joint.add_unit(unit("b")).unwrap();
        assert_eq!(joint.len(), 2);
        assert!(joint.unit("b").is_some());
    }

    #[test]
    fn duplicate_names_rejected_at_construction() {
        let err = JointComparison::new(vec![unit("a"), unit("b"), unit("a")]).err().unwrap();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn external_fake_data_is_all_or_nothing() {
        let mut joint = JointComparison::new(vec![unit("a"), unit("b")]).unwrap();
        let mut bad = BTreeMap::new();
        bad.insert("a".to_string(), vec![1.0; 4]);
        bad.insert("zzz".to_string(), vec![1.0; 4]);
        assert!(joint.set_fake_data(FakeData::External(bad)).is_err());
        assert_eq!(joint.unit("a").unwrap().data().values, vec![3.0, 1.0, 4.0, 1.0]);

        let mut short = BTreeMap::new();
        short.insert("b".to_string(), vec![1.0; 3]);
        assert!(joint.set_fake_data(FakeData::External(short)).is_err());

        let mut good = BTreeMap::new();
        good.insert("b".to_string(), vec![5.0; 4]);
        joint.set_fake_data(FakeData::External(good)).unwrap();
        assert_eq!(joint.unit("b").unwrap().data().values, vec![5.0; 4]);
        joint.reset_data();
        assert_eq!(joint.unit("b").unwrap().data().values, vec![3.0, 1.0, 4.0, 1.0]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut seq = JointComparison::new(vec![unit("a"), unit("b")]).unwrap();
        let mut par = JointComparison::new(vec![unit("a"), unit("b")]).unwrap().with_parallel(true);
        let dials = DialState::new();
        let s1 = seq.reconfigure_all(&one, &dials).unwrap();
        let s2 = par.reconfigure_all(&one, &dials).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(seq.likelihood(), par.likelihood());
        let summary = par.summary();
        assert_eq!(summary.units.len(), 2);
        assert_eq!(summary.ndof, 8);
    }

    #[test]
    fn forced_full_pass_after_fast_state() {
        let mut joint = JointComparison::new(vec![unit("a"), unit("b")]).unwrap().with_parallel(true);
        let dials = DialState::new();
        joint.reconfigure_all(&one, &dials).unwrap();
        joint.reconfigure_all(&one, &dials).unwrap();
        assert!(joint.units().iter().all(|u| u.last_pass().unwrap().mode == ReconfigureMode::Fast));
        let before: Vec<Vec<f64>> = joint.units().iter().map(|u| u.prediction().contents()).collect();

        let stats = joint.reconfigure_all_full(&one, &dials).unwrap();
        assert_eq!(stats.len(), 2);
        for s in &stats {
            assert_eq!(s.mode, ReconfigureMode::Full);
            assert_eq!(s.n_events_scanned, 20);
            assert_eq!(s.n_signal, 10);
        }
        let after: Vec<Vec<f64>> = joint.units().iter().map(|u| u.prediction().contents()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn renormalise_all_follows_norm_dial_without_a_pass() {
        let mut joint = JointComparison::new(vec![unit("a"), unit("b")]).unwrap();
        let mut dials = DialState::new();
        joint.reconfigure_all(&one, &dials).unwrap();
        let pass_a = *joint.unit("a").unwrap().last_pass().unwrap();
        assert_eq!(joint.unit("a").unwrap().prediction().integral(), 10.0);

        dials.set("a_norm", 2.0);
        joint.renormalise_all(&one, &dials).unwrap();
        let a = joint.unit("a").unwrap();
        assert_eq!(a.last_pass(), Some(&pass_a));
        assert_eq!(a.current_norm(), 2.0);
        assert_eq!(a.prediction().integral(), 20.0);
        assert_eq!(joint.unit("b").unwrap().prediction().integral(), 10.0);

        dials.set("a_norm", 0.5);
        joint.renormalise_all(&one, &dials).unwrap();
        assert_eq!(joint.unit("a").unwrap().prediction().integral(), 5.0);
    }
}

//! Comparison routines: parameter and sample setup, fake data and the
//! strategy loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nf_core::{ConfigKey, DialState, Error, Result, ReweightEngine};
use serde::Serialize;

use crate::joint::{FakeData, JointComparison, JointSummary};
use crate::sample_list::create_sample;
use crate::weight::{DialKind, DialWeightEngine};

/// Routines accepted in the `strategy` list.
pub const ALLOWED_ROUTINES: &[&str] = &["Compare"];

/// Inputs for [`ComparisonRoutines::setup`].
#[derive(Debug, Clone, Default)]
pub struct RoutineConfig {
    /// `parameter` keys: `type`, `name`, `nom`, optional `low`/`high`/`step`/`state`/`modes`.
    pub parameters: Vec<ConfigKey>,
    /// `sample` keys: `name`, `input`, `data`, optional `type`/`norm`.
    pub samples: Vec<ConfigKey>,
    /// `fakeparameter` keys: `name`, `nom`.
    pub fake_parameters: Vec<ConfigKey>,
    /// Comma-separated routine list.
    pub strategy: String,
    /// `MC` or a JSON file of per-sample values.
    pub fake_data: Option<String>,
    /// Process samples in parallel.
    pub parallel: bool,
    /// Evaluate every sample at the nominal parameter values before the strategy runs.
    pub save_nominal: bool,
}

/// One configured dial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    /// Dial name.
    pub name: String,
    /// Parameter type string.
    pub kind: String,
    /// Nominal (starting) value.
    pub nominal: f64,
    /// Lower limit.
    pub low: Option<f64>,
    /// Upper limit.
    pub high: Option<f64>,
    /// Step size.
    pub step: Option<f64>,
    /// State string (`FIX`, `FREE`, ...).
    pub state: String,
}

/// Output of [`ComparisonRoutines::run`].
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Routines that were run.
    pub strategy: Vec<String>,
    /// Dial values the comparison was made at.
    pub parameters: BTreeMap<String, f64>,
    /// Fake-data setting, if any.
    pub fake_data: Option<String>,
    /// Joint statistic and per-sample detail.
    pub joint: JointSummary,
    /// Joint statistic at the nominal parameter values, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal: Option<JointSummary>,
}

/// Parameter and sample setup plus the comparison routines.
pub struct ComparisonRoutines {
    params: Vec<ParameterSpec>,
    current: BTreeMap<String, f64>,
    fake: BTreeMap<String, f64>,
    dials: DialState,
    engine: DialWeightEngine,
    joint: JointComparison,
    strategy: Vec<String>,
    fake_data: Option<String>,
    save_nominal: bool,
    base_dir: PathBuf,
}

impl ComparisonRoutines {
    /// Read parameters, samples and fake parameters; build every sample.
    ///
    /// Relative file paths are resolved against `base_dir`.
    pub fn setup(config: RoutineConfig, base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let strategy: Vec<String> =
            config.strategy.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        if strategy.is_empty() {
            return Err(Error::Validation("no routines given in strategy".into()));
        }
        if let Some(bad) = strategy.iter().find(|r| !ALLOWED_ROUTINES.contains(&r.as_str())) {
            return Err(Error::Validation(format!(
                "unknown routine '{bad}' (allowed: {})",
                ALLOWED_ROUTINES.join(",")
            )));
        }

        let mut params = Vec::new();
        let mut current = BTreeMap::new();
        let mut engine = DialWeightEngine::new();

        log::info!("number of parameters: {}", config.parameters.len());
        for (i, key) in config.parameters.iter().enumerate() {
            let spec = parameter_spec(i, key)?;
            let modes = parse_modes(&spec.name, &key.get_list("modes", ','))?;
            engine.add_dial(spec.name.clone(), DialKind::parse(&spec.name, &spec.kind, &modes)?);
            log::info!("read {} : {} = {} : {}", spec.kind, spec.name, spec.nominal, spec.state);
            current.insert(spec.name.clone(), spec.nominal);
            params.push(spec);
        }

        log::info!("number of samples: {}", config.samples.len());
        let mut joint = JointComparison::default().with_parallel(config.parallel);
        for key in &config.samples {
            let unit = create_sample(key, &base_dir)?;
            log::info!(
                "read sample {} (input {}, type {}, norm {})",
                unit.name(),
                key.get_str("input").unwrap_or(""),
                key.get_str("type").unwrap_or("DEFAULT"),
                unit.configured_norm()
            );
            if unit.options().is_free() {
                let name = unit.norm_dial_name();
                if !engine.has_dial(&name) {
                    engine.add_dial(name.clone(), DialKind::NormParameter);
                    current.insert(name.clone(), unit.configured_norm());
                    params.push(ParameterSpec {
                        name,
                        kind: "norm_parameter".into(),
                        nominal: unit.configured_norm(),
                        low: None,
                        high: None,
                        step: None,
                        state: "FREE".into(),
                    });
                }
            }
            joint.add_unit(unit)?;
        }

        let mut fake = BTreeMap::new();
        for (i, key) in config.fake_parameters.iter().enumerate() {
            let name = key
                .get_str("name")
                .ok_or_else(|| Error::Validation(format!("no name given for fakeparameter {i}")))?;
            let nom = key
                .get_f64("nom")?
                .ok_or_else(|| Error::Validation(format!("no nominal given for fakeparameter {i}")))?;
            if !current.contains_key(name) {
                log::warn!("fake parameter '{name}' is not a configured parameter and will be ignored");
            }
            fake.insert(name.to_string(), nom);
        }

        Ok(Self {
            params,
            current,
            fake,
            dials: DialState::new(),
            engine,
            joint,
            strategy,
            fake_data: config.fake_data,
            save_nominal: config.save_nominal,
            base_dir,
        })
    }

    /// Configured parameters, in order.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Current dial state.
    pub fn dials(&self) -> &DialState {
        &self.dials
    }

    /// The joint comparison.
    pub fn joint(&self) -> &JointComparison {
        &self.joint
    }

    /// Set configured parameters from `values` and reconfigure the engine.
    ///
    /// Names that are not configured parameters are skipped.
    pub fn update_rw_engine(&mut self, values: &BTreeMap<String, f64>) -> Result<()> {
        let updates: Vec<(&str, f64)> = self
            .params
            .iter()
            .filter_map(|p| values.get(&p.name).map(|&v| (p.name.as_str(), v)))
            .collect();
        self.dials.update(updates);
        self.engine.reconfigure(&self.dials)
    }

    /// Replace sample data according to the `fake_data` setting.
    ///
    /// `MC` evaluates every sample at the fake-parameter values, takes those
    /// predictions as data, then restores the current values.
    pub fn set_fake_data(&mut self) -> Result<()> {
        let Some(input) = self.fake_data.clone() else {
            return Ok(());
        };
        if input == "MC" {
            log::info!("setting fake data from MC starting prediction");
            let fake = self.fake.clone();
            self.update_rw_engine(&fake)?;
            self.joint.reconfigure_all(&self.engine, &self.dials)?;
            self.joint.set_fake_data(FakeData::Mc)?;
            let current = self.current.clone();
            self.update_rw_engine(&current)?;
        } else {
            let path = self.base_dir.join(&input);
            log::info!("setting fake data from {}", path.display());
            self.joint.set_fake_data(FakeData::from_json_file(path)?)?;
        }
        Ok(())
    }

    /// Run every routine in the strategy.
    pub fn run(&mut self) -> Result<ComparisonReport> {
        let current = self.current.clone();
        self.update_rw_engine(&current)?;
        self.set_fake_data()?;

        let nominal = if self.save_nominal { Some(self.save_nominal()?) } else { None };

        for routine in self.strategy.clone() {
            log::info!("routine: {routine}");
            match routine.as_str() {
                "Compare" => self.generate_comparison()?,
                other => return Err(Error::Validation(format!("unknown routine '{other}'"))),
            }
        }

        Ok(ComparisonReport {
            strategy: self.strategy.clone(),
            parameters: self.dials.iter().map(|(k, v)| (k.to_string(), v)).collect(),
            fake_data: self.fake_data.clone(),
            joint: self.joint.summary(),
            nominal,
        })
    }

    /// Evaluate every sample at the nominal parameter values.
    ///
    /// Leaves the dials at nominal; the next routine sets its own values.
    pub fn save_nominal(&mut self) -> Result<JointSummary> {
        log::info!("saving nominal predictions");
        let nominal: BTreeMap<String, f64> = self.params.iter().map(|p| (p.name.clone(), p.nominal)).collect();
        self.update_rw_engine(&nominal)?;
        self.joint.reconfigure_all(&self.engine, &self.dials)?;
        self.print_state();
        Ok(self.joint.summary())
    }

    /// Evaluate every sample at the current dial values and log the result.
    pub fn generate_comparison(&mut self) -> Result<()> {
        log::info!("generating comparison");
        let current = self.current.clone();
        self.update_rw_engine(&current)?;
        self.joint.reconfigure_all(&self.engine, &self.dials)?;
        self.print_state();
        Ok(())
    }

    /// Log parameter values and the joint likelihood.
    pub fn print_state(&self) {
        let width = self.params.iter().map(|p| p.name.len()).max().unwrap_or(0).max(9);
        log::info!("------------");
        log::info!(" #    {:<width$} = {:<10} {:<8}", "Parameter", "Value", "State");
        for (i, p) in self.params.iter().enumerate() {
            let value = self.dials.get_or(&p.name, p.nominal);
            log::info!(" {i:<3}. {:<width$} = {value:<10.5} {:<8}", p.name, p.state);
        }
        log::info!("------------");
        log::info!("{:<46}{}", "Likelihood for JointFCN: ", self.joint.likelihood());
        log::info!("------------");
    }
}

fn parameter_spec(i: usize, key: &ConfigKey) -> Result<ParameterSpec> {
    let kind = key
        .get_str("type")
        .ok_or_else(|| Error::Validation(format!("no type given for parameter {i}")))?;
    let name = key
        .get_str("name")
        .ok_or_else(|| Error::Validation(format!("no name given for parameter {i}")))?;
    let nominal = key
        .get_f64("nom")?
        .ok_or_else(|| Error::Validation(format!("no nominal given for parameter {i}")))?;
    Ok(ParameterSpec {
        name: name.to_string(),
        kind: kind.to_string(),
        nominal,
        low: key.get_f64("low")?,
        high: key.get_f64("high")?,
        step: key.get_f64("step")?,
        state: key.get_str("state").unwrap_or("FIX").to_string(),
    })
}

fn parse_modes(name: &str, modes: &[String]) -> Result<Vec<i32>> {
    modes
        .iter()
        .map(|m| {
            m.parse::<i32>()
                .map_err(|_| Error::Validation(format!("dial '{name}': bad mode '{m}'")))
        })
        .collect()
}

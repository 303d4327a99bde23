//! Dial-driven reweighting engine.

use std::collections::BTreeMap;

use nf_core::{DialState, Error, InteractionRecord, Result, ReweightEngine};

/// Effect of one dial on event weights.
#[derive(Debug, Clone, PartialEq)]
pub enum DialKind {
    /// Sample normalisation; read by the unit, no per-event weight.
    NormParameter,
    /// Overall factor `1 + value` on every record.
    GlobalNorm,
    /// Factor `1 + value` on records whose `|mode|` is listed.
    ModeNorm(Vec<i32>),
}

impl DialKind {
    /// Parse a parameter `type` string. `modes` is used by `mode_norm`.
    pub fn parse(name: &str, kind: &str, modes: &[i32]) -> Result<Self> {
        match kind {
            "norm_parameter" | "norm" => Ok(Self::NormParameter),
            "global_norm" => Ok(Self::GlobalNorm),
            "mode_norm" => {
                if modes.is_empty() {
                    return Err(Error::Validation(format!("dial '{name}': mode_norm needs 'modes'")));
                }
                Ok(Self::ModeNorm(modes.to_vec()))
            }
            other => Err(Error::Validation(format!("dial '{name}': unknown parameter type '{other}'"))),
        }
    }
}

/// Reweighting engine built from named dials.
///
/// Dials not present in the [`DialState`] sit at their nominal value of 0 and
/// leave weights untouched.
#[derive(Debug, Clone, Default)]
pub struct DialWeightEngine {
    dials: BTreeMap<String, DialKind>,
    configured_version: Option<u64>,
}

impl DialWeightEngine {
    /// Engine without dials (every weight is 1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dial.
    pub fn add_dial(&mut self, name: impl Into<String>, kind: DialKind) {
        self.dials.insert(name.into(), kind);
    }

    /// Whether `name` is registered.
    pub fn has_dial(&self, name: &str) -> bool {
        self.dials.contains_key(name)
    }

    /// Registered dial names.
    pub fn dial_names(&self) -> impl Iterator<Item = &str> {
        self.dials.keys().map(String::as_str)
    }

    /// Version of the dial state seen by the last [`ReweightEngine::reconfigure`].
    pub fn configured_version(&self) -> Option<u64> {
        self.configured_version
    }
}

impl ReweightEngine for DialWeightEngine {
    fn reconfigure(&mut self, dials: &DialState) -> Result<()> {
        for (name, value) in dials.iter() {
            if !value.is_finite() {
                return Err(Error::Validation(format!("dial '{name}' has non-finite value {value}")));
            }
            if !self.dials.contains_key(name) {
                log::warn!("dial '{name}' is set but not registered with the engine");
            }
        }
        self.configured_version = Some(dials.version());
        log::debug!("reweight engine reconfigured at dial version {}", dials.version());
        Ok(())
    }

    fn calc_weight(&self, record: &InteractionRecord, dials: &DialState) -> f64 {
        let mut weight = 1.0;
        for (name, kind) in &self.dials {
            let value = dials.get_or(name, 0.0);
            match kind {
                DialKind::NormParameter => {}
                DialKind::GlobalNorm => weight *= 1.0 + value,
                DialKind::ModeNorm(modes) => {
                    if modes.contains(&record.mode.abs()) {
                        weight *= 1.0 + value;
                    }
                }
            }
        }
        weight
    }

    fn name(&self) -> &str {
        "dial_weight_engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_norm_applies_to_listed_modes() {
        let mut engine = DialWeightEngine::new();
        engine.add_dial("ccqe_norm", DialKind::ModeNorm(vec![1]));
        engine.add_dial("total", DialKind::GlobalNorm);
        engine.add_dial("sample_norm", DialKind::NormParameter);

        let mut dials = DialState::new();
        dials.set("ccqe_norm", 0.5);
        dials.set("total", -0.5);
        dials.set("sample_norm", 3.0);
        engine.reconfigure(&dials).unwrap();
        assert_eq!(engine.configured_version(), Some(dials.version()));

        assert_eq!(engine.calc_weight(&InteractionRecord::new(-1, vec![]), &dials), 0.75);
        assert_eq!(engine.calc_weight(&InteractionRecord::new(11, vec![]), &dials), 0.5);
    }

    #[test]
    fn unset_dials_are_nominal() {
        let mut engine = DialWeightEngine::new();
        engine.add_dial("total", DialKind::GlobalNorm);
        assert_eq!(engine.calc_weight(&InteractionRecord::new(1, vec![]), &DialState::new()), 1.0);
    }

    #[test]
    fn parse_and_reject() {
        assert_eq!(DialKind::parse("a", "global_norm", &[]).unwrap(), DialKind::GlobalNorm);
        assert!(DialKind::parse("a", "mode_norm", &[]).is_err());
        assert!(DialKind::parse("a", "neut_parameter", &[]).is_err());

        let mut dials = DialState::new();
        dials.set("x", f64::NAN);
        assert!(DialWeightEngine::new().reconfigure(&dials).is_err());
    }
}

//! YAML comparison card.
//!
//! ```yaml
//! strategy: Compare
//! parameters:
//!   - { type: mode_norm, name: res_norm, nom: 0.2, modes: [11, 12, 13] }
//! samples:
//!   - { name: T2K_CC1pip_H2O_XSec_1Dpmu_nu, input: events.json, data: data.json, type: DIAG }
//! fake_parameters:
//!   - { name: res_norm, nom: 0.5 }
//! fake_data: MC
//! save_nominal: true
//! ```
//!
//! Entries are flat maps of scalars; a list value becomes a comma-joined string.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use nf_core::ConfigKey;
use nf_fit::RoutineConfig;
use serde::Deserialize;
use serde_yaml_ng::Value;

type Entry = BTreeMap<String, Value>;

fn default_strategy() -> String {
    "Compare".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Card {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub parameters: Vec<Entry>,
    #[serde(default)]
    pub samples: Vec<Entry>,
    #[serde(default)]
    pub fake_parameters: Vec<Entry>,
    #[serde(default)]
    pub fake_data: Option<String>,
    #[serde(default)]
    pub save_nominal: bool,
}

impl Card {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading card {}", path.display()))?;
        serde_yaml_ng::from_slice(&bytes).with_context(|| format!("parsing card {}", path.display()))
    }

    pub fn into_routine_config(self, parallel: bool) -> Result<RoutineConfig> {
        Ok(RoutineConfig {
            parameters: keys("parameters", &self.parameters)?,
            samples: keys("samples", &self.samples)?,
            fake_parameters: keys("fake_parameters", &self.fake_parameters)?,
            strategy: self.strategy,
            fake_data: self.fake_data,
            parallel,
            save_nominal: self.save_nominal,
        })
    }
}

fn keys(section: &str, entries: &[Entry]) -> Result<Vec<ConfigKey>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut key = ConfigKey::new();
            for (name, value) in entry {
                if let Some(s) = scalar_string(value).with_context(|| format!("{section}[{i}].{name}"))? {
                    key.set(name, s);
                }
            }
            Ok(key)
        })
        .collect()
}

fn scalar_string(value: &Value) -> Result<Option<String>> {
    Ok(match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match scalar_string(item)? {
                    Some(s) if !matches!(item, Value::Sequence(_)) => parts.push(s),
                    Some(_) => bail!("nested lists are not supported"),
                    None => {}
                }
            }
            Some(parts.join(","))
        }
        Value::Mapping(_) => bail!("expected a scalar or a list of scalars"),
        Value::Tagged(t) => scalar_string(&t.value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Card {
        serde_yaml_ng::from_str(text).unwrap()
    }

    #[test]
    fn scalars_and_lists_become_strings() {
        let card = parse(
            r#"
parameters:
  - { type: mode_norm, name: res, nom: 0.25, modes: [11, 12, 13], fixed: true }
samples:
  - name: T2K_CC1pip_H2O_XSec_1Dpmu_nu
    input: ev.json
    data: d.json
    norm: 1
    type: ~
"#,
        );
        assert_eq!(card.strategy, "Compare");
        let cfg = card.into_routine_config(false).unwrap();
        let p = &cfg.parameters[0];
        assert_eq!(p.get_str("modes"), Some("11,12,13"));
        assert_eq!(p.get_f64("nom").unwrap(), Some(0.25));
        assert_eq!(p.get_str("fixed"), Some("true"));
        let s = &cfg.samples[0];
        assert_eq!(s.get_f64("norm").unwrap(), Some(1.0));
        assert!(!s.has("type"));
        assert!(cfg.fake_data.is_none());
        assert!(!cfg.save_nominal);
    }

    #[test]
    fn save_nominal_is_carried_over() {
        let cfg = parse("save_nominal: true\n").into_routine_config(true).unwrap();
        assert!(cfg.save_nominal);
        assert!(cfg.parallel);
    }

    #[test]
    fn nested_values_are_rejected() {
        let card = parse("samples:\n  - { name: a, input: { file: x } }\n");
        let err = card.into_routine_config(false).unwrap_err();
        assert!(format!("{err:#}").contains("samples[0].input"));

        let card = parse("parameters:\n  - { name: a, modes: [[1, 2]] }\n");
        assert!(card.into_routine_config(false).is_err());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(serde_yaml_ng::from_str::<Card>("strategy: Compare\nsample: []\n").is_err());
    }
}

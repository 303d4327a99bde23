//! Named key/value configuration records.
//!
//! Samples and parameters are described by flat records looked up by key
//! name (`name`, `input`, `type`, `norm`, ...). Values are kept as strings
//! and parsed on access so that any front end can produce them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A flat key/value configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigKey {
    values: BTreeMap<String, String>,
}

impl ConfigKey {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a string value (builder style).
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a value.
    pub fn set(&mut self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Whether `name` is present.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// String value of `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// String value of `name`, or a validation error naming the missing key.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.get_str(name).ok_or_else(|| {
            Error::Validation(format!(
                "missing key '{}' in {}",
                name,
                self.get_str("name").map(|n| format!("'{n}'")).unwrap_or_else(|| "record".into())
            ))
        })
    }

    /// Numeric value of `name`; `Ok(None)` when absent.
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        match self.get_str(name) {
            None => Ok(None),
            Some(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| Error::Validation(format!("key '{name}': cannot parse '{s}': {e}"))),
        }
    }

    /// Numeric value of `name`, or `default` when absent.
    pub fn get_f64_or(&self, name: &str, default: f64) -> Result<f64> {
        Ok(self.get_f64(name)?.unwrap_or(default))
    }

    /// Value of `name` split on `delim`, trimmed, empty pieces dropped.
    pub fn get_list(&self, name: &str, delim: char) -> Vec<String> {
        self.get_str(name)
            .map(|s| {
                s.split(delim).map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect()
            })
            .unwrap_or_default()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let key = ConfigKey::new()
            .with("name", "T2K_CC1pip_H2O_XSec_1Dpmu_nu")
            .with("input", "a.json;b.json")
            .with("norm", 1.2);
        assert_eq!(key.require_str("name").unwrap(), "T2K_CC1pip_H2O_XSec_1Dpmu_nu");
        assert_eq!(key.get_f64_or("norm", 1.0).unwrap(), 1.2);
        assert_eq!(key.get_f64_or("missing", 1.0).unwrap(), 1.0);
        assert_eq!(key.get_list("input", ';'), vec!["a.json", "b.json"]);
    }

    #[test]
    fn missing_and_bad_values() {
        let key = ConfigKey::new().with("name", "s").with("norm", "abc");
        let err = key.require_str("input").unwrap_err();
        assert!(err.to_string().contains("missing key 'input'"));
        assert!(key.get_f64("norm").is_err());
    }
}

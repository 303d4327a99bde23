//! Sample `type` option strings.
//!
//! A type string is a `/`-separated list of tokens, e.g. `FREE/DIAG/NORM`.
//! `DEFAULT` (or an empty string) selects the channel default. User tokens
//! are applied on top of the default and must be allowed by the channel.

use nf_core::{Error, Result};

/// How the sample normalisation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormState {
    /// Fixed at the configured value.
    Fix,
    /// Controlled by a `<name>_norm` dial.
    Free,
    /// Prediction rescaled to the data integral (shape-only comparison).
    Shape,
}

/// Which part of the covariance enters the statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovarianceUse {
    /// Full matrix, including bin-to-bin correlations.
    Full,
    /// Diagonal only.
    Diag,
}

/// How the raw weighted sums are converted before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Flux-averaged differential cross section (per bin width).
    XSec,
    /// Raw weighted event counts.
    Events,
}

/// Parsed sample options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOptions {
    /// Normalisation treatment.
    pub norm_state: NormState,
    /// Covariance treatment.
    pub covariance: CovarianceUse,
    /// Scaling mode.
    pub scale: ScaleMode,
    /// Add a normalisation penalty term to the statistic.
    pub norm_penalty: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            norm_state: NormState::Fix,
            covariance: CovarianceUse::Full,
            scale: ScaleMode::XSec,
            norm_penalty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Norm,
    Covariance,
    Scale,
    Penalty,
}

fn token_group(token: &str) -> Option<Group> {
    match token {
        "FIX" | "FREE" | "SHAPE" => Some(Group::Norm),
        "FULL" | "DIAG" => Some(Group::Covariance),
        "XSEC" | "EVT" => Some(Group::Scale),
        "NORM" => Some(Group::Penalty),
        _ => None,
    }
}

fn tokens(s: &str) -> Vec<String> {
    s.split('/').map(|t| t.trim().to_ascii_uppercase()).filter(|t| !t.is_empty()).collect()
}

impl SampleOptions {
    /// Parse `type_str` for sample `sample`, starting from the channel default.
    pub fn parse(sample: &str, type_str: &str, default: &str, allowed: &[&str]) -> Result<Self> {
        let mut opts = SampleOptions::default();
        for t in tokens(default) {
            opts.apply(&t);
        }

        let trimmed = type_str.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("DEFAULT") {
            return Ok(opts);
        }

        let mut seen: Vec<Group> = Vec::new();
        for t in tokens(trimmed) {
            let group = token_group(&t).ok_or_else(|| {
                Error::Validation(format!("sample '{sample}': unknown type token '{t}'"))
            })?;
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&t)) {
                return Err(Error::Validation(format!(
                    "sample '{sample}': type '{t}' not allowed (allowed: {})",
                    allowed.join(",")
                )));
            }
            if seen.contains(&group) {
                return Err(Error::Validation(format!(
                    "sample '{sample}': conflicting type tokens in '{type_str}'"
                )));
            }
            seen.push(group);
            opts.apply(&t);
        }
        Ok(opts)
    }

    fn apply(&mut self, token: &str) {
        match token {
            "FIX" => self.norm_state = NormState::Fix,
            "FREE" => self.norm_state = NormState::Free,
            "SHAPE" => self.norm_state = NormState::Shape,
            "FULL" => self.covariance = CovarianceUse::Full,
            "DIAG" => self.covariance = CovarianceUse::Diag,
            "XSEC" => self.scale = ScaleMode::XSec,
            "EVT" => self.scale = ScaleMode::Events,
            "NORM" => self.norm_penalty = true,
            _ => {}
        }
    }

    /// Whether the sample norm is driven by a dial.
    pub fn is_free(&self) -> bool {
        self.norm_state == NormState::Free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["FIX", "FREE", "SHAPE", "FULL", "DIAG", "NORM"];

    #[test]
    fn default_string() {
        let o = SampleOptions::parse("s", "DEFAULT", "FIX/FULL", ALLOWED).unwrap();
        assert_eq!(o, SampleOptions::default());
        let o = SampleOptions::parse("s", "", "EVT/SHAPE/DIAG", &["EVT", "SHAPE", "DIAG"]).unwrap();
        assert_eq!(o.scale, ScaleMode::Events);
        assert_eq!(o.norm_state, NormState::Shape);
        assert_eq!(o.covariance, CovarianceUse::Diag);
    }

    #[test]
    fn user_tokens_override_default() {
        let o = SampleOptions::parse("s", "free/diag/NORM", "FIX/FULL", ALLOWED).unwrap();
        assert!(o.is_free());
        assert_eq!(o.covariance, CovarianceUse::Diag);
        assert!(o.norm_penalty);
        assert_eq!(o.scale, ScaleMode::XSec);
    }

    #[test]
    fn rejects_disallowed_unknown_and_conflicting() {
        assert!(SampleOptions::parse("s", "EVT", "FIX/FULL", ALLOWED).is_err());
        assert!(SampleOptions::parse("s", "BOGUS", "FIX/FULL", ALLOWED).is_err());
        let err = SampleOptions::parse("s", "FIX/FREE", "FIX/FULL", ALLOWED).unwrap_err();
        assert!(err.to_string().contains("conflicting"));
    }
}

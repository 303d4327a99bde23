//! Channel registry: sample name → signal predicate and channel metadata.

use nf_core::{Error, Result, SignalPredicate};

use crate::channels::{anl, mcstudy, minerva, miniboone, t2k};

/// Static description of an analysis channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelInfo {
    /// Sample name used in configuration.
    pub name: &'static str,
    /// Number of projection axes (1 or 2).
    pub dimension: usize,
    /// Neutrino-energy window `(min, max)` in MeV; `min >= max` means none.
    pub enu_range: (f64, f64),
    /// Type string applied when the user gives `DEFAULT`.
    pub default_type: &'static str,
    /// Type tokens the user may select.
    pub allowed_types: &'static [&'static str],
    /// Fractional normalisation uncertainty for the `NORM` penalty.
    pub norm_error: f64,
    /// Extra factor on the cross-section scale (target conversion).
    pub scale_multiplier: f64,
    /// Axis titles.
    pub title: &'static str,
}

impl ChannelInfo {
    /// Defaults shared by most cross-section channels.
    pub const fn xsec_1d(name: &'static str, enu_range: (f64, f64), title: &'static str) -> Self {
        Self {
            name,
            dimension: 1,
            enu_range,
            default_type: "FIX/FULL",
            allowed_types: XSEC_TYPES,
            norm_error: 0.0,
            scale_multiplier: 1.0,
            title,
        }
    }
}

/// Type tokens accepted by flux-averaged cross-section channels.
pub const XSEC_TYPES: &[&str] = &["FIX", "FREE", "SHAPE", "FULL", "DIAG", "NORM"];

type Builder = fn(&ChannelInfo) -> Box<dyn SignalPredicate>;

struct Entry {
    info: ChannelInfo,
    build: Builder,
}

static CHANNELS: &[Entry] = &[
    Entry { info: miniboone::CC1PI0_Q2, build: miniboone::cc1pi0_q2 },
    Entry { info: miniboone::CC1PIP_Q2, build: miniboone::cc1pip_q2 },
    Entry { info: miniboone::CCQE_2D_TCOS, build: miniboone::ccqe_2d_tcos },
    Entry { info: anl::CC1PPIP_COSTH_ADLER, build: anl::cc1ppip_costh_adler },
    Entry { info: t2k::CC1PIP_H2O_PMU, build: t2k::cc1pip_h2o_pmu },
    Entry { info: minerva::CC1PIP_TH, build: minerva::cc1pip_th },
    Entry { info: minerva::CCNPIP_TPI, build: minerva::ccnpip_tpi },
    Entry { info: mcstudy::KAON_PRESELECTION, build: mcstudy::kaon_preselection },
];

/// Names of all registered channels, in registration order.
pub fn channel_names() -> Vec<&'static str> {
    CHANNELS.iter().map(|e| e.info.name).collect()
}

/// Metadata for `name`.
pub fn channel_info(name: &str) -> Result<ChannelInfo> {
    CHANNELS
        .iter()
        .find(|e| e.info.name == name)
        .map(|e| e.info)
        .ok_or_else(|| Error::UnknownSample(name.to_string()))
}

/// Construct the signal predicate for `name`.
pub fn create_predicate(name: &str) -> Result<(ChannelInfo, Box<dyn SignalPredicate>)> {
    let entry = CHANNELS
        .iter()
        .find(|e| e.info.name == name)
        .ok_or_else(|| Error::UnknownSample(name.to_string()))?;
    log::debug!("creating predicate for channel {name}");
    Ok((entry.info, (entry.build)(&entry.info)))
}

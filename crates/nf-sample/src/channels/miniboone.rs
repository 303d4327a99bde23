//! MiniBooNE muon-neutrino channels (CH2 target).

use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};

use crate::kinematics;
use crate::registry::ChannelInfo;
use crate::signal;

/// CC1π⁰ dσ/dQ².
pub const CC1PI0_Q2: ChannelInfo = ChannelInfo {
    norm_error: 0.107,
    scale_multiplier: 14.08,
    ..ChannelInfo::xsec_1d(
        "MiniBooNE_CC1pi0_XSec_1DQ2_nu",
        (500.0, 2000.0),
        "Q^{2}_{CC#pi} (GeV^{2}); d#sigma/dQ^{2} (cm^{2}/GeV^{2})",
    )
};

/// CC1π⁺ dσ/dQ².
pub const CC1PIP_Q2: ChannelInfo = ChannelInfo::xsec_1d(
    "MiniBooNE_CC1pip_XSec_1DQ2_nu",
    (500.0, 2000.0),
    "Q^{2}_{CC#pi} (GeV^{2}); d#sigma/dQ^{2} (cm^{2}/GeV^{2})",
);

/// CCQE-like d²σ/dT_μ dcosθ_μ.
pub const CCQE_2D_TCOS: ChannelInfo = ChannelInfo {
    dimension: 2,
    norm_error: 0.107,
    ..ChannelInfo::xsec_1d(
        "MiniBooNE_CCQE_XSec_2DTcos_nu",
        (0.0, 3000.0),
        "T_{#mu} (GeV); cos#theta_{#mu}; d^{2}#sigma/dT_{#mu}dcos#theta_{#mu} (cm^{2}/GeV)",
    )
};

/// Single-pion production binned in true Q².
struct SinglePionQ2 {
    name: &'static str,
    pion: i32,
    enu: (f64, f64),
}

impl SignalPredicate for SinglePionQ2 {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        if record.num_fs_particle(&[self.pion]) == 0 {
            return v;
        }
        if let (Some(nu), Some(mu)) = (record.neutrino_in(), record.hm_fs_particle(13)) {
            v.x = kinematics::q2(&nu.p, &mu.p);
        }
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        signal::is_cc1pi(record, 14, self.pion, self.enu.0, self.enu.1)
    }
}

/// Build the CC1π⁰ Q² predicate.
pub fn cc1pi0_q2(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(SinglePionQ2 { name: info.name, pion: 111, enu: info.enu_range })
}

/// Build the CC1π⁺ Q² predicate.
pub fn cc1pip_q2(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(SinglePionQ2 { name: info.name, pion: 211, enu: info.enu_range })
}

struct CcqeTcos {
    name: &'static str,
    enu: (f64, f64),
}

impl SignalPredicate for CcqeTcos {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        if let (Some(nu), Some(mu)) = (record.neutrino_in(), record.hm_fs_particle(13)) {
            v.x = kinematics::kinetic_energy_gev(&mu.p);
            v.y = kinematics::cos_theta(&nu.p, &mu.p);
        }
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        signal::is_ccqe_like(record, 14, self.enu.0, self.enu.1)
    }
}

/// Build the CCQE 2D predicate.
pub fn ccqe_2d_tcos(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(CcqeTcos { name: info.name, enu: info.enu_range })
}

//! T2K ND280 CC1π⁺ on water.

use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};

use crate::kinematics;
use crate::registry::ChannelInfo;
use crate::signal;

/// dσ/dp_μ.
pub const CC1PIP_H2O_PMU: ChannelInfo = ChannelInfo::xsec_1d(
    "T2K_CC1pip_H2O_XSec_1Dpmu_nu",
    (0.0, 0.0),
    "p_{#mu} (GeV/c); d#sigma/dp_{#mu} (cm^{2}/(GeV/c)/nucleon)",
);

struct CC1pipPmu {
    name: &'static str,
    enu: (f64, f64),
}

impl SignalPredicate for CC1pipPmu {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        if let Some(mu) = record.hm_fs_particle(13) {
            v.x = kinematics::momentum_gev(&mu.p);
        }
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        signal::is_cc1pi(record, 14, 211, self.enu.0, self.enu.1)
    }
}

/// Build the T2K p_μ predicate.
pub fn cc1pip_h2o_pmu(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(CC1pipPmu { name: info.name, enu: info.enu_range })
}

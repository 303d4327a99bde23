//! ANL 12ft bubble chamber, CC1π⁺ on protons.

use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};

use crate::kinematics;
use crate::registry::ChannelInfo;
use crate::signal;

/// Raw event counts in the Adler-frame pion angle.
pub const CC1PPIP_COSTH_ADLER: ChannelInfo = ChannelInfo {
    name: "ANL_CC1ppip_Evt_1DcosthAdler_nu",
    dimension: 1,
    enu_range: (0.0, 6000.0),
    default_type: "EVT/SHAPE/DIAG",
    allowed_types: &["EVT", "SHAPE", "DIAG"],
    norm_error: 0.0,
    scale_multiplier: 1.0,
    title: "cos#theta_{Adler}; Number of events",
};

/// Resonance-mass cut applied to the p π⁺ system (MeV).
const W_CUT: f64 = 1400.0;

struct CosThAdler {
    name: &'static str,
    enu: (f64, f64),
}

impl SignalPredicate for CosThAdler {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        let (Some(nu), Some(mu), Some(pi), Some(p)) = (
            record.neutrino_in(),
            record.hm_fs_particle(13),
            record.hm_fs_particle(211),
            record.hm_fs_particle(2212),
        ) else {
            return v;
        };
        v.x = kinematics::cos_theta_adler(&nu.p, &mu.p, &pi.p, &p.p, W_CUT);
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        signal::is_cc1pi_3prong(record, 14, 211, 2212, self.enu.0, self.enu.1)
    }
}

/// Build the ANL cosθ_Adler predicate.
pub fn cc1ppip_costh_adler(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(CosThAdler { name: info.name, enu: info.enu_range })
}

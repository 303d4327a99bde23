//! Monte Carlo studies without measured data of their own.

use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};

use crate::kinematics;
use crate::registry::ChannelInfo;
use crate::signal;

const KAON_PLUS: i32 = 321;

/// CC events with at least one K⁺, binned in leading K⁺ momentum (GeV).
pub const KAON_PRESELECTION: ChannelInfo = ChannelInfo {
    name: "MCStudy_KaonPreSelection",
    dimension: 1,
    enu_range: (0.0, 0.0),
    default_type: "EVT/FIX/DIAG",
    allowed_types: &["EVT", "FIX", "FREE", "SHAPE", "DIAG"],
    norm_error: 0.0,
    scale_multiplier: 1.0,
    title: "p_{K^{+}} (GeV); Events",
};

struct KaonPreSelection {
    name: &'static str,
}

impl SignalPredicate for KaonPreSelection {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        if let Some(k) = record.hm_fs_particle(KAON_PLUS) {
            v.x = kinematics::momentum_gev(&k.p);
            v.z = record.num_fs_particle(&[KAON_PLUS]) as f64;
        }
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        let nu_pdg = record.neutrino_in().map(|p| p.pdg).unwrap_or(14);
        signal::is_ccinc(record, nu_pdg, 0.0, 0.0) && record.num_fs_particle(&[KAON_PLUS]) > 0
    }
}

/// Build the kaon preselection predicate.
pub fn kaon_preselection(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(KaonPreSelection { name: info.name })
}

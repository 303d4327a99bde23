//! MINERvA charged-pion channels (CH target, 1.5 < E_ν < 10 GeV).

use nf_core::{InteractionRecord, ProjectionValues, SignalPredicate};

use crate::kinematics;
use crate::registry::ChannelInfo;
use crate::signal::{self, CHARGED_PIONS};

/// CC1π± dσ/dθ_π (degrees).
pub const CC1PIP_TH: ChannelInfo = ChannelInfo::xsec_1d(
    "MINERvA_CC1pip_XSec_1Dth_nu",
    (1500.0, 10000.0),
    "#theta_{#pi} (degrees); d#sigma/d#theta_{#pi} (cm^{2}/degrees/nucleon)",
);

/// CCNπ± dσ/dT_π (GeV).
pub const CCNPIP_TPI: ChannelInfo = ChannelInfo::xsec_1d(
    "MINERvA_CCNpip_XSec_1DTpi_nu",
    (1500.0, 10000.0),
    "T_{#pi} (GeV); d#sigma/dT_{#pi} (cm^{2}/GeV/nucleon)",
);

#[derive(Clone, Copy)]
enum PionVar {
    Theta,
    Kinetic,
}

#[derive(Clone, Copy)]
enum Topology {
    Single,
    Multi,
}

struct ChargedPion {
    name: &'static str,
    enu: (f64, f64),
    var: PionVar,
    topology: Topology,
}

impl SignalPredicate for ChargedPion {
    fn name(&self) -> &str {
        self.name
    }

    fn derive_variables(&self, record: &InteractionRecord) -> ProjectionValues {
        let mut v = ProjectionValues::for_mode(record.mode);
        let (Some(nu), Some(pi)) = (record.neutrino_in(), record.hm_fs_particle_any(&CHARGED_PIONS))
        else {
            return v;
        };
        v.x = match self.var {
            PionVar::Theta => kinematics::theta_deg(&nu.p, &pi.p),
            PionVar::Kinetic => kinematics::kinetic_energy_gev(&pi.p),
        };
        v
    }

    fn is_signal(&self, record: &InteractionRecord) -> bool {
        let (lo, hi) = self.enu;
        match self.topology {
            Topology::Single => signal::is_cc1pip_minerva(record, lo, hi, false),
            Topology::Multi => signal::is_ccnpip_minerva(record, lo, hi, false),
        }
    }
}

/// Build the CC1π± θ_π predicate.
pub fn cc1pip_th(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(ChargedPion {
        name: info.name,
        enu: info.enu_range,
        var: PionVar::Theta,
        topology: Topology::Single,
    })
}

/// Build the CCNπ± T_π predicate.
pub fn ccnpip_tpi(info: &ChannelInfo) -> Box<dyn SignalPredicate> {
    Box::new(ChargedPion {
        name: info.name,
        enu: info.enu_range,
        var: PionVar::Kinetic,
        topology: Topology::Multi,
    })
}

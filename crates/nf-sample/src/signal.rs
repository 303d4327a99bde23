//! Signal definitions shared by channels.
//!
//! Energy bounds are in MeV. An empty range (`emin >= emax`) disables the
//! neutrino-energy cut. Every definition returns `false` (never an error) when
//! the record lacks the particles it needs.

use nf_core::InteractionRecord;

use crate::kinematics;

/// PDG codes of the charged pions.
pub const CHARGED_PIONS: [i32; 2] = [211, -211];

/// Charged-current inclusive: incoming `nu_pdg` within the energy range and an
/// outgoing charged lepton of the matching flavour.
pub fn is_ccinc(record: &InteractionRecord, nu_pdg: i32, emin: f64, emax: f64) -> bool {
    let Some(nu) = record.hm_is_particle(nu_pdg) else {
        return false;
    };
    if emin < emax && (nu.p.e < emin || nu.p.e > emax) {
        return false;
    }
    let lepton = if nu_pdg > 0 { nu_pdg - 1 } else { nu_pdg + 1 };
    record.num_fs_particle(&[lepton]) > 0
}

/// CC with one charged lepton and no mesons.
pub fn is_cc0pi(record: &InteractionRecord, nu_pdg: i32, emin: f64, emax: f64) -> bool {
    is_ccinc(record, nu_pdg, emin, emax)
        && record.num_fs_leptons() == 1
        && record.num_fs_mesons() == 0
}

/// CCQE-like: CC0π topology.
pub fn is_ccqe_like(record: &InteractionRecord, nu_pdg: i32, emin: f64, emax: f64) -> bool {
    is_cc0pi(record, nu_pdg, emin, emax)
}

/// CC with one lepton and exactly one meson, which is a `pi_pdg`.
pub fn is_cc1pi(record: &InteractionRecord, nu_pdg: i32, pi_pdg: i32, emin: f64, emax: f64) -> bool {
    is_ccinc(record, nu_pdg, emin, emax)
        && record.num_fs_leptons() == 1
        && record.num_fs_mesons() == 1
        && record.num_fs_particle(&[pi_pdg]) == 1
}

/// CC1π with exactly one outgoing `nucleon_pdg` (lepton, pion, nucleon).
pub fn is_cc1pi_3prong(
    record: &InteractionRecord,
    nu_pdg: i32,
    pi_pdg: i32,
    nucleon_pdg: i32,
    emin: f64,
    emax: f64,
) -> bool {
    is_cc1pi(record, nu_pdg, pi_pdg, emin, emax) && record.num_fs_particle(&[nucleon_pdg]) == 1
}

/// MINERvA CC1π±: one charged pion, one lepton, `W_rec ≤ 1400 MeV`.
///
/// With `restricted`, the muon must also be within 20° of the neutrino.
pub fn is_cc1pip_minerva(record: &InteractionRecord, emin: f64, emax: f64, restricted: bool) -> bool {
    if !is_ccinc(record, 14, emin, emax) {
        return false;
    }
    if record.num_fs_particle(&CHARGED_PIONS) != 1 || record.num_fs_leptons() != 1 {
        return false;
    }
    let (Some(nu), Some(mu)) = (record.hm_is_particle(14), record.hm_fs_particle(13)) else {
        return false;
    };
    if restricted && kinematics::theta_deg(&mu.p, &nu.p) >= 20.0 {
        return false;
    }
    kinematics::w_rec(&nu.p, &mu.p) <= 1400.0
}

/// MINERvA CCNπ±: at least one charged pion, one lepton, `0 ≤ W_rec ≤ 1800 MeV`.
pub fn is_ccnpip_minerva(record: &InteractionRecord, emin: f64, emax: f64, restricted: bool) -> bool {
    if !is_ccinc(record, 14, emin, emax) {
        return false;
    }
    if record.num_fs_particle(&CHARGED_PIONS) == 0 || record.num_fs_leptons() != 1 {
        return false;
    }
    let (Some(nu), Some(mu)) = (record.neutrino_in(), record.hm_fs_particle(13)) else {
        return false;
    };
    if restricted && kinematics::theta_deg(&mu.p, &nu.p) >= 20.0 {
        return false;
    }
    let w = kinematics::w_rec(&nu.p, &mu.p);
    (0.0..=1800.0).contains(&w)
}

/// Whether the highest-momentum final-state `pdg` has kinetic energy above
/// `threshold` (MeV).
pub fn has_ke_above(record: &InteractionRecord, pdg: i32, threshold: f64) -> bool {
    record.hm_fs_particle(pdg).is_some_and(|p| p.kinetic_energy() > threshold)
}

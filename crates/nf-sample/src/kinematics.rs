//! Kinematic quantities used by channel projections.
//!
//! Inputs are four-momenta in MeV. Return units are noted per function.

use nf_core::FourMomentum;

/// Nucleon mass used in reconstructed quantities (MeV).
pub const NUCLEON_MASS: f64 = 938.272;

/// Muon mass (MeV).
pub const MUON_MASS: f64 = 105.658;

/// `Q² = −(p_ν − p_ℓ)²` in GeV².
pub fn q2(pnu: &FourMomentum, plep: &FourMomentum) -> f64 {
    -(*pnu - *plep).mag2() / 1.0e6
}

/// Hadronic invariant mass reconstructed from the lepton side (MeV).
///
/// Assumes a nucleon at rest: `W² = M² + 2M(E_ν − E_ℓ) − Q²`. Returns `-1`
/// when `W²` is negative.
pub fn w_rec(pnu: &FourMomentum, plep: &FourMomentum) -> f64 {
    let q2_mev = -(*pnu - *plep).mag2();
    let w2 = NUCLEON_MASS * NUCLEON_MASS + 2.0 * NUCLEON_MASS * (pnu.e - plep.e) - q2_mev;
    if w2 < 0.0 { -1.0 } else { w2.sqrt() }
}

/// Invariant mass of two particles (MeV).
pub fn invariant_mass(a: &FourMomentum, b: &FourMomentum) -> f64 {
    (*a + *b).mag()
}

/// Kinetic energy `E − m` in GeV.
pub fn kinetic_energy_gev(p: &FourMomentum) -> f64 {
    (p.e - p.mag()) / 1000.0
}

/// Momentum magnitude in GeV.
pub fn momentum_gev(p: &FourMomentum) -> f64 {
    p.p() / 1000.0
}

/// `cos θ` between two three-momenta.
pub fn cos_theta(a: &FourMomentum, b: &FourMomentum) -> f64 {
    a.angle(b).cos()
}

/// Angle between two three-momenta in degrees.
pub fn theta_deg(a: &FourMomentum, b: &FourMomentum) -> f64 {
    a.angle(b).to_degrees()
}

/// Adler-frame `cos θ` of the pion in the Δ rest frame.
///
/// The z axis is the momentum transfer `p_ν − p_μ` seen in the resonance
/// frame. Returns `-999` when the nucleon–pion system has `W ≥ w_cut` (MeV)
/// so the event lands in underflow.
pub fn cos_theta_adler(
    pnu: &FourMomentum,
    pmu: &FourMomentum,
    ppi: &FourMomentum,
    pnucleon: &FourMomentum,
    w_cut: f64,
) -> f64 {
    let resonance = *ppi + *pnucleon;
    if resonance.mag() >= w_cut {
        return -999.0;
    }
    let b = resonance.boost_vector();
    let back = [-b[0], -b[1], -b[2]];
    let pnu_r = pnu.boost(back);
    let pmu_r = pmu.boost(back);
    let ppi_r = ppi.boost(back);
    let z = (pnu_r - pmu_r).vect();
    nf_core::types::angle_between(z, ppi_r.vect()).cos()
}

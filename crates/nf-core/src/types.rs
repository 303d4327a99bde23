//! Common data types for nufit

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Lorentz four-vector `(px, py, pz, E)` in MeV.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    /// x component of momentum.
    pub px: f64,
    /// y component of momentum.
    pub py: f64,
    /// z component of momentum.
    pub pz: f64,
    /// Total energy.
    pub e: f64,
}

impl FourMomentum {
    /// Create a four-vector from its components.
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Three-momentum components.
    #[inline]
    pub fn vect(&self) -> [f64; 3] {
        [self.px, self.py, self.pz]
    }

    /// Magnitude of the three-momentum.
    #[inline]
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Invariant mass squared `E² − p²` (may be negative for spacelike vectors).
    #[inline]
    pub fn mag2(&self) -> f64 {
        self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz)
    }

    /// Invariant mass. Spacelike vectors return `-sqrt(-m²)`.
    pub fn mag(&self) -> f64 {
        let m2 = self.mag2();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Opening angle between the three-momenta of `self` and `other` (radians).
    ///
    /// Returns 0 when either vector has zero length.
    pub fn angle(&self, other: &FourMomentum) -> f64 {
        angle_between(self.vect(), other.vect())
    }

    /// Velocity `p / E` of this four-vector.
    pub fn boost_vector(&self) -> [f64; 3] {
        [self.px / self.e, self.py / self.e, self.pz / self.e]
    }

    /// Lorentz boost by velocity `b` (in units of c).
    pub fn boost(&self, b: [f64; 3]) -> FourMomentum {
        let b2 = b[0] * b[0] + b[1] * b[1] + b[2] * b[2];
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = b[0] * self.px + b[1] * self.py + b[2] * self.pz;
        let gamma2 = if b2 > 0.0 { (gamma - 1.0) / b2 } else { 0.0 };

        FourMomentum {
            px: self.px + gamma2 * bp * b[0] + gamma * b[0] * self.e,
            py: self.py + gamma2 * bp * b[1] + gamma * b[1] * self.e,
            pz: self.pz + gamma2 * bp * b[2] + gamma * b[2] * self.e,
            e: gamma * (self.e + bp),
        }
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum::new(self.px + rhs.px, self.py + rhs.py, self.pz + rhs.pz, self.e + rhs.e)
    }
}

impl Sub for FourMomentum {
    type Output = FourMomentum;

    fn sub(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum::new(self.px - rhs.px, self.py - rhs.py, self.pz - rhs.pz, self.e - rhs.e)
    }
}

/// Angle between two three-vectors (radians), 0 for degenerate input.
pub fn angle_between(a: [f64; 3], b: [f64; 3]) -> f64 {
    let ma = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    let mb = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    let cos = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) / (ma * mb);
    cos.clamp(-1.0, 1.0).acos()
}

/// Position of a particle in the interaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleState {
    /// Incoming neutrino or target.
    Initial,
    /// Particle leaving the nucleus.
    FinalState,
    /// Intermediate or nuclear-remnant particle.
    Other,
}

/// One entry in the generator particle stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// PDG code.
    pub pdg: i32,
    /// Stack status.
    pub state: ParticleState,
    /// Four-momentum (MeV).
    pub p: FourMomentum,
}

impl Particle {
    /// Create a particle.
    pub fn new(pdg: i32, state: ParticleState, p: FourMomentum) -> Self {
        Self { pdg, state, p }
    }

    /// Kinetic energy `E − m` (MeV).
    pub fn kinetic_energy(&self) -> f64 {
        self.p.e - self.p.mag()
    }
}

fn default_input_weight() -> f64 {
    1.0
}

/// One simulated neutrino interaction.
///
/// Records are owned by an [`crate::EventSource`] and only borrowed during a
/// pass; the computed weight is returned by the pass rather than written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Weight assigned at generation (flux/joint-input scaling).
    #[serde(default = "default_input_weight")]
    pub input_weight: f64,
    /// Generator interaction-mode code.
    pub mode: i32,
    /// Particle stack.
    #[serde(default)]
    pub particles: Vec<Particle>,
}

impl InteractionRecord {
    /// Create a record with unit input weight.
    pub fn new(mode: i32, particles: Vec<Particle>) -> Self {
        Self { input_weight: 1.0, mode, particles }
    }

    /// Set the input weight (builder style).
    pub fn with_input_weight(mut self, w: f64) -> Self {
        self.input_weight = w;
        self
    }

    /// Final-state particles.
    pub fn final_state(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.state == ParticleState::FinalState)
    }

    /// The incoming neutrino (first initial-state neutrino on the stack).
    pub fn neutrino_in(&self) -> Option<&Particle> {
        self.particles
            .iter()
            .find(|p| p.state == ParticleState::Initial && matches!(p.pdg.abs(), 12 | 14 | 16))
    }

    /// Incoming neutrino energy (MeV), 0 when there is none.
    pub fn enu(&self) -> f64 {
        self.neutrino_in().map(|p| p.p.e).unwrap_or(0.0)
    }

    /// Highest-momentum initial-state particle with the given PDG code.
    pub fn hm_is_particle(&self, pdg: i32) -> Option<&Particle> {
        highest_momentum(
            self.particles.iter().filter(|p| p.state == ParticleState::Initial && p.pdg == pdg),
        )
    }

    /// Highest-momentum final-state particle with the given PDG code.
    pub fn hm_fs_particle(&self, pdg: i32) -> Option<&Particle> {
        highest_momentum(self.final_state().filter(|p| p.pdg == pdg))
    }

    /// Highest-momentum final-state particle matching any of `pdgs`.
    pub fn hm_fs_particle_any(&self, pdgs: &[i32]) -> Option<&Particle> {
        highest_momentum(self.final_state().filter(|p| pdgs.contains(&p.pdg)))
    }

    /// Number of final-state particles whose PDG code is in `pdgs`.
    pub fn num_fs_particle(&self, pdgs: &[i32]) -> usize {
        self.final_state().filter(|p| pdgs.contains(&p.pdg)).count()
    }

    /// Number of final-state charged leptons (e, μ, τ and antiparticles).
    pub fn num_fs_leptons(&self) -> usize {
        self.final_state().filter(|p| matches!(p.pdg.abs(), 11 | 13 | 15)).count()
    }

    /// Number of final-state mesons (PDG codes 100..1000 in magnitude).
    pub fn num_fs_mesons(&self) -> usize {
        self.final_state().filter(|p| (100..1000).contains(&p.pdg.abs())).count()
    }
}

fn highest_momentum<'a>(it: impl Iterator<Item = &'a Particle>) -> Option<&'a Particle> {
    it.fold(None, |best: Option<&Particle>, p| match best {
        Some(b) if b.p.p() >= p.p.p() => Some(b),
        _ => Some(p),
    })
}

/// Projection variables derived once per signal record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectionValues {
    /// First projection axis.
    pub x: f64,
    /// Second projection axis (2D samples).
    pub y: f64,
    /// Third projection variable (kept for bookkeeping).
    pub z: f64,
    /// Interaction mode of the record.
    pub mode: i32,
}

impl ProjectionValues {
    /// All-zero projections for a record with the given mode.
    pub fn for_mode(mode: i32) -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, mode }
    }
}

/// Versioned dial (parameter) vector.
///
/// Every mutation bumps [`DialState::version`]. Passes borrow the state
/// immutably, so dials cannot change while a pass reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialState {
    values: BTreeMap<String, f64>,
    version: u64,
}

impl DialState {
    /// Empty dial state (version 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a dial value, inserting the dial if it is new.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
        self.version += 1;
    }

    /// Set several dials at once (one version bump).
    pub fn update<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, f64)>) {
        for (name, value) in values {
            self.values.insert(name.to_string(), value);
        }
        self.version += 1;
    }

    /// Current value of a dial.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Current value of a dial, or `default` if it is not defined.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Whether a dial is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over `(name, value)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of dials.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no dial is defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn muon(px: f64, pz: f64) -> Particle {
        let m: f64 = 105.658;
        let e = (px * px + pz * pz + m * m).sqrt();
        Particle::new(13, ParticleState::FinalState, FourMomentum::new(px, 0.0, pz, e))
    }

    #[test]
    fn test_four_momentum_mass() {
        let p = muon(300.0, 400.0).p;
        assert_relative_eq!(p.p(), 500.0, epsilon = 1e-9);
        assert_relative_eq!(p.mag(), 105.658, epsilon = 1e-6);
    }

    #[test]
    fn test_boost_to_rest_frame() {
        let p = muon(300.0, 400.0).p;
        let b = p.boost_vector();
        let rest = p.boost([-b[0], -b[1], -b[2]]);
        assert_relative_eq!(rest.p(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(rest.e, 105.658, epsilon = 1e-6);
    }

    #[test]
    fn test_angle() {
        let a = FourMomentum::new(1.0, 0.0, 0.0, 1.0);
        let b = FourMomentum::new(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(a.angle(&b), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(a.angle(&FourMomentum::default()), 0.0);
    }

    #[test]
    fn test_record_queries() {
        let nu = Particle::new(14, ParticleState::Initial, FourMomentum::new(0.0, 0.0, 1000.0, 1000.0));
        let rec = InteractionRecord::new(
            1,
            vec![nu, muon(10.0, 200.0), muon(10.0, 500.0)],
        );
        assert_eq!(rec.enu(), 1000.0);
        assert_eq!(rec.num_fs_particle(&[13]), 2);
        assert_eq!(rec.num_fs_leptons(), 2);
        assert_relative_eq!(rec.hm_fs_particle(13).unwrap().p.pz, 500.0);
        assert!(rec.hm_fs_particle(211).is_none());
        assert_eq!(rec.input_weight, 1.0);
    }

    #[test]
    fn test_dial_state_versioning() {
        let mut dials = DialState::new();
        assert_eq!(dials.version(), 0);
        dials.set("MaCCQE", 0.5);
        dials.set("MaCCQE", 1.0);
        assert_eq!(dials.version(), 2);
        assert_eq!(dials.get("MaCCQE"), Some(1.0));
        assert_eq!(dials.get_or("missing", 3.0), 3.0);
        dials.update([("a", 1.0), ("b", 2.0)]);
        assert_eq!(dials.version(), 3);
        assert_eq!(dials.len(), 3);
    }

    #[test]
    fn test_record_default_input_weight_from_json() {
        let rec: InteractionRecord = serde_json::from_str(r#"{"mode": 11}"#).unwrap();
        assert_eq!(rec.input_weight, 1.0);
        assert!(rec.particles.is_empty());
    }
}

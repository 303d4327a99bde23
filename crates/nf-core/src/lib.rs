//! # nf-core
//!
//! Core types and traits for nufit.
//!
//! The reconfiguration engine in `nf-sample` only talks to the outside world
//! through the traits defined here: an [`EventSource`] provides interaction
//! records, a [`ReweightEngine`] maps a record and a [`DialState`] to a weight,
//! and a [`SignalPredicate`] classifies records for one analysis channel.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use key::ConfigKey;
pub use traits::{EventSource, ReweightEngine, SignalPredicate};
pub use types::{DialState, FourMomentum, InteractionRecord, Particle, ParticleState, ProjectionValues};

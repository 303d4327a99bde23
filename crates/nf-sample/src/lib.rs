//! # nf-sample
//!
//! Measurement units ("samples") and their reconfiguration engine.
//!
//! A [`MeasurementUnit`] binds an event source, a channel's signal predicate,
//! a prediction histogram and the measured data with its covariance. The
//! first pass over the events (a *full* pass) caches the signal records and
//! their projection variables in a [`SignalEventCache`]; later passes where
//! only dial values changed (*fast* passes) re-weight the cached records only.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nf_core::{ConfigKey, DialState, InteractionRecord};
//! use nf_sample::{MeasuredData, MeasurementUnit, VecEventSource};
//!
//! let source = Arc::new(VecEventSource::from_json_file("events.json").unwrap());
//! let data = MeasuredData::from_json_file("data.json").unwrap();
//! let key = ConfigKey::new().with("name", "T2K_CC1pip_H2O_XSec_1Dpmu_nu");
//! let mut unit = MeasurementUnit::from_key(&key, source, data).unwrap();
//!
//! let engine = |_: &InteractionRecord, d: &DialState| 1.0 + d.get_or("scale", 0.0);
//! let mut dials = DialState::new();
//! unit.fast_reconfigure(&engine, &dials).unwrap(); // first call runs a full pass
//! dials.set("scale", 0.2);
//! unit.fast_reconfigure(&engine, &dials).unwrap(); // re-weights cached signal only
//! println!("chi2 = {}", unit.likelihood());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod channels;
pub mod data;
pub mod input;
pub mod kinematics;
pub mod likelihood;
pub mod measurement;
pub mod options;
pub mod reconfigure;
pub mod registry;
pub mod signal;

pub use cache::{CacheEntry, SignalEventCache};
pub use data::{Covariance, MeasuredData};
pub use input::{EventFile, JointEventSource, VecEventSource};
pub use likelihood::Statistic;
pub use measurement::{MeasurementUnit, UnitSummary};
pub use options::{CovarianceUse, NormState, SampleOptions, ScaleMode};
pub use reconfigure::{CacheValidity, PassStats, ReconfigureMode};
pub use registry::{ChannelInfo, channel_info, channel_names, create_predicate};

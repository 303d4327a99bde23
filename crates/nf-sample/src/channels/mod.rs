//! Analysis channels.
//!
//! Each module exposes a [`ChannelInfo`](crate::registry::ChannelInfo)
//! constant per channel and a constructor returning its boxed predicate; the
//! registry ties the two together.

pub mod anl;
pub mod mcstudy;
pub mod minerva;
pub mod miniboone;
pub mod t2k;

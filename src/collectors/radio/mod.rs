//! Radio cell sampling
//!
//! Backends deliver a raw [`CellSnapshot`]; [`RadioSampler`] normalizes it into
//! a [`CellMeasurement`](crate::models::CellMeasurement) using the capability
//! level and the channel tables in [`frequency`].

pub mod capability;
pub mod frequency;
pub mod reading;
pub mod sampler;

pub use capability::{CapabilityLevel, CellField, FieldSupport};
pub use frequency::{ChannelFamily, ChannelInfo};
pub use reading::{CellSnapshot, GsmCell, LteCell, NrCell, ObservedCell, RadioCell, WcdmaCell};
pub use sampler::RadioSampler;

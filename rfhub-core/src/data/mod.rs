//! Persistent data model
//!
//! Entity types, per-type signal validation and the JSON store backing
//! the registry.

pub mod persistence;
mod types;
mod validation;

pub use types::{DeviceEntry, DeviceType, MappingCategory, SignalMapping};
pub use validation::validate_device_signals;

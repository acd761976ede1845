//! Signal classification
//!
//! Turns raw pulse-train payloads into fingerprints, matches them against
//! the reference action table and suggests a device type for learning.

mod classifier;
mod fingerprint;
mod table;

pub use classifier::{infer_device_type, Classification, Classifier};
pub use fingerprint::SignalFingerprint;
pub use table::ActionTable;

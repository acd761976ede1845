//! RF Hub Core Library
//!
//! Classification, registry and coordination for a 433/868 MHz RF gateway.
//!
//! # Features
//!
//! - **Fingerprint Classification**: Reduce raw pulse-train payloads to a
//!   canonical shape and match them against a reference table built from
//!   the vendor control-unit catalog
//! - **Device & Mapping Registry**: Persistent device and payload-metadata
//!   stores with crash-safe whole-collection saves
//! - **Learning/Dispatch Hub**: Capture-mode state machine, signal fan-out
//!   to subscribers and raw-transmit routing
//! - **Vendor Catalog**: In-tree control-unit library with deterministic
//!   pulse generation per manufacturer/model/action
//!
//! # Module Structure
//!
//! - `classify/` - Fingerprints, reference table, classifier
//! - `data/` - Entity types, validation, JSON persistence
//! - `vendor/` - Static control-unit catalog and pulse generation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rfhub_core::{Hub, Registry, Transmitter};
//!
//! struct GatewayDriver;
//! impl Transmitter for GatewayDriver {
//!     fn send(&self, _payload: &str) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::open_default().unwrap();
//! let hub = Hub::new(registry, Arc::new(GatewayDriver));
//! hub.start_learning();
//! ```

// Grouped modules
pub mod classify;
pub mod data;
pub mod vendor;

// Standalone modules
pub mod constants;
pub mod events;
pub mod hub;
pub mod registry;
pub mod service;

// Re-export classifier types
pub use classify::{infer_device_type, ActionTable, Classification, Classifier, SignalFingerprint};

// Re-export data types and validation
pub use data::{validate_device_signals, DeviceEntry, DeviceType, MappingCategory, SignalMapping};

// Re-export hub and subscription types
pub use events::{EventBus, SubscriptionHandle};
pub use hub::{generate_device_id, Hub, Transmitter};
pub use registry::Registry;

// Re-export command dispatch
pub use service::{dispatch, process_request};

// Re-export vendor catalog types
pub use vendor::{library, Action, ChannelConfig, ControlUnit, PulseTrain};

// Re-export error types
pub use rfhub_error::{Result, RfHubError};

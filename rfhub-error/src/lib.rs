//! Unified error handling for rfhub
//!
//! This crate provides a single error type used across all rfhub components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using RfHubError
pub type Result<T> = std::result::Result<T, RfHubError>;

/// Unified error type for all rfhub operations
#[derive(thiserror::Error, Debug)]
pub enum RfHubError {
    // ============================================================================
    // I/O and Persistence Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read store {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write store {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Store file too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Device Registry Errors
    // ============================================================================
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Unknown action {action:?} for device {device_id}")]
    UnknownAction {
        device_id: String,
        action: String,
    },

    #[error("Invalid signals for {device_type}: missing {missing:?}, unexpected {unexpected:?}")]
    InvalidSignalMapping {
        device_type: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    // ============================================================================
    // Signal Mapping Errors
    // ============================================================================
    #[error("Unknown mapping category: {0}")]
    InvalidMappingCategory(String),

    // ============================================================================
    // Vendor Library Errors
    // ============================================================================
    #[error("Invalid value {value:?} for channel config field {field} (pattern {pattern})")]
    InvalidConfigValue {
        field: String,
        value: String,
        pattern: String,
    },

    #[error("Missing channel config field: {0}")]
    MissingConfigField(String),

    #[error("Action {action} not supported by {manufacturer} {model}")]
    UnsupportedAction {
        manufacturer: String,
        model: String,
        action: String,
    },

    // ============================================================================
    // Transmit Errors
    // ============================================================================
    #[error("Transmit failed: {0}")]
    TransmitFailure(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Generic(String),
}

impl RfHubError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transmit error from a string
    pub fn transmit(msg: impl Into<String>) -> Self {
        Self::TransmitFailure(msg.into())
    }

    /// Create an unknown-device error
    pub fn unknown_device(device_id: impl Into<String>) -> Self {
        Self::UnknownDevice(device_id.into())
    }

    /// Create an unknown-action error
    pub fn unknown_action(device_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnknownAction {
            device_id: device_id.into(),
            action: action.into(),
        }
    }
}

// Allow converting from String to RfHubError
impl From<String> for RfHubError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to RfHubError
impl From<&str> for RfHubError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

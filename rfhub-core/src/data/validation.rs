//! Per-type signal validation
//!
//! Each device type fixes which signal labels are required and whether
//! labels outside the known set are allowed. Checked before any state
//! mutation or persistence.

use std::collections::BTreeMap;

use rfhub_error::{Result, RfHubError};

use super::types::DeviceType;

/// Required and optional labels for the closed device types. Open types
/// (button, universal) accept arbitrary labels but need at least one.
fn label_rules(device_type: DeviceType) -> Option<(&'static [&'static str], &'static [&'static str])> {
    match device_type {
        DeviceType::Switch => Some((&["on", "off"], &[])),
        DeviceType::BinarySensor => Some((&["trigger"], &[])),
        DeviceType::Light => Some((&["on"], &["off", "bright", "dim"])),
        DeviceType::Button | DeviceType::Universal => None,
    }
}

/// Validate a device's signals mapping against its type.
///
/// Reports all offending labels at once so a caller can fix the request
/// in a single round trip.
pub fn validate_device_signals(
    device_type: DeviceType,
    signals: &BTreeMap<String, String>,
) -> Result<()> {
    match label_rules(device_type) {
        Some((required, optional)) => {
            // A required label with an empty payload counts as missing
            let missing: Vec<String> = required
                .iter()
                .filter(|label| signals.get(**label).map_or(true, |payload| payload.is_empty()))
                .map(|label| label.to_string())
                .collect();
            let unexpected: Vec<String> = signals
                .keys()
                .filter(|label| {
                    !required.contains(&label.as_str()) && !optional.contains(&label.as_str())
                })
                .cloned()
                .collect();

            if missing.is_empty() && unexpected.is_empty() {
                Ok(())
            } else {
                Err(RfHubError::InvalidSignalMapping {
                    device_type: device_type.to_string(),
                    missing,
                    unexpected,
                })
            }
        }
        None => {
            if signals.is_empty() {
                Err(RfHubError::InvalidSignalMapping {
                    device_type: device_type.to_string(),
                    missing: vec!["at least one action".to_string()],
                    unexpected: Vec::new(),
                })
            } else {
                Ok(())
            }
        }
    }
}

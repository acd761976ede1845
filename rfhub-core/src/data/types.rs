//! Persistent entity types
//!
//! Devices and signal mappings are the two persisted collections. Both are
//! plain records; per-type rules live in `validation`, not on the types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use rfhub_error::RfHubError;

/// Coarse device category determining which signal labels are required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Switch,
    Light,
    BinarySensor,
    Button,
    Universal,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Switch => "switch",
            DeviceType::Light => "light",
            DeviceType::BinarySensor => "binary_sensor",
            DeviceType::Button => "button",
            DeviceType::Universal => "universal",
        }
    }

    pub const ALL: [DeviceType; 5] = [
        DeviceType::Switch,
        DeviceType::Light,
        DeviceType::BinarySensor,
        DeviceType::Button,
        DeviceType::Universal,
    ];
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = RfHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switch" => Ok(DeviceType::Switch),
            "light" => Ok(DeviceType::Light),
            "binary_sensor" => Ok(DeviceType::BinarySensor),
            "button" => Ok(DeviceType::Button),
            "universal" => Ok(DeviceType::Universal),
            other => Err(RfHubError::config(format!("unknown device type: {other}"))),
        }
    }
}

/// Closed category set for signal mappings. Modeled as an enum so an
/// invalid category is rejected at construction and at deserialization,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingCategory {
    Switch,
    Light,
    Sensor,
    Remote,
    Doorbell,
    Other,
}

impl MappingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingCategory::Switch => "switch",
            MappingCategory::Light => "light",
            MappingCategory::Sensor => "sensor",
            MappingCategory::Remote => "remote",
            MappingCategory::Doorbell => "doorbell",
            MappingCategory::Other => "other",
        }
    }
}

impl fmt::Display for MappingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingCategory {
    type Err = RfHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switch" => Ok(MappingCategory::Switch),
            "light" => Ok(MappingCategory::Light),
            "sensor" => Ok(MappingCategory::Sensor),
            "remote" => Ok(MappingCategory::Remote),
            "doorbell" => Ok(MappingCategory::Doorbell),
            "other" => Ok(MappingCategory::Other),
            unknown => Err(RfHubError::InvalidMappingCategory(unknown.to_string())),
        }
    }
}

/// Persisted device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub device_id: String,
    pub name: String,
    pub device_type: DeviceType,
    /// Action label to raw payload
    pub signals: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Payload metadata independent of device ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMapping {
    pub payload: String,
    pub category: MappingCategory,
    pub label: String,
    #[serde(default)]
    pub linked_devices: Vec<String>,
}

impl SignalMapping {
    /// Construct from a raw category string, failing before any store
    /// interaction when the category is outside the closed set.
    pub fn new(
        payload: impl Into<String>,
        category: &str,
        label: impl Into<String>,
        linked_devices: Vec<String>,
    ) -> rfhub_error::Result<SignalMapping> {
        Ok(SignalMapping {
            payload: payload.into(),
            category: category.parse()?,
            label: label.into(),
            linked_devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_round_trips_through_str() {
        for device_type in DeviceType::ALL {
            let parsed: DeviceType = device_type.as_str().parse().unwrap();
            assert_eq!(parsed, device_type);
        }
    }

    #[test]
    fn test_unknown_device_type_is_rejected() {
        assert!("thermostat".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_invalid_category_fails_construction() {
        let err = SignalMapping::new("TXP:...", "spaceship", "Porch", vec![]).unwrap_err();
        assert!(matches!(err, RfHubError::InvalidMappingCategory(_)));
    }

    #[test]
    fn test_invalid_category_fails_deserialization() {
        let json = r#"{"payload":"p","category":"spaceship","label":"x"}"#;
        assert!(serde_json::from_str::<SignalMapping>(json).is_err());
    }

    #[test]
    fn test_device_entry_serde_shape() {
        let json = r#"{
            "device_id": "abc",
            "name": "Lamp",
            "device_type": "binary_sensor",
            "signals": {"trigger": "TXP:0,0,8,5600,320,2,1,3,3,1"}
        }"#;
        let entry: DeviceEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.device_type, DeviceType::BinarySensor);
        assert!(entry.metadata.is_empty());
    }
}

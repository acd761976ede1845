use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global request ID counter for correlation
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Maximum message size for the UI channel (64KB; pulse payloads are long)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Maximum length of a raw pulse-train payload string
pub const MAX_PAYLOAD_LENGTH: usize = 4096;

/// Maximum length of user-facing names and labels
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum number of signal bindings on a single device
pub const MAX_SIGNALS_PER_DEVICE: usize = 32;

/// Maximum number of devices a mapping may link to
pub const MAX_LINKED_DEVICES: usize = 64;

/// Device types a device entry may carry (wire values, snake_case)
pub const SUPPORTED_DEVICE_TYPES: &[&str] =
    &["switch", "light", "binary_sensor", "button", "universal"];

/// Closed set of signal-mapping categories (wire values)
pub const MAPPING_CATEGORIES: &[&str] =
    &["switch", "light", "sensor", "remote", "doorbell", "other"];

/// Generate a unique request ID for correlation
pub fn generate_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation and debugging
    pub id: u64,
    /// The actual request
    #[serde(flatten)]
    pub request: Request,
}

impl RequestEnvelope {
    pub fn new(request: Request) -> Self {
        Self {
            id: generate_request_id(),
            request,
        }
    }

    pub fn with_id(request: Request, id: u64) -> Self {
        Self { id, request }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data")]
pub enum Request {
    LearningStart,
    LearningStop,
    LearningStatus,
    SignalsList,
    DeviceCreate {
        name: String,
        device_type: String,
        signals: BTreeMap<String, String>,
        #[serde(default)]
        metadata: BTreeMap<String, serde_json::Value>,
    },
    DeviceDelete { device_id: String },
    DeviceList,
    DeviceReload,
    DeviceSend { device_id: String, action: String },
    SignalMapList,
    SignalMapUpdate {
        payload: String,
        category: String,
        label: String,
        #[serde(default)]
        linked_devices: Vec<String>,
    },
    SignalMapDelete { payload: String },
}

impl Request {
    /// Validate request parameters before dispatching to the hub
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Request::LearningStart
            | Request::LearningStop
            | Request::LearningStatus
            | Request::SignalsList
            | Request::DeviceList
            | Request::DeviceReload
            | Request::SignalMapList => Ok(()),

            Request::DeviceCreate { name, device_type, signals, metadata: _ } => {
                validate_name(name)?;
                validate_device_type(device_type)?;
                validate_signals(signals)?;
                Ok(())
            }

            Request::DeviceDelete { device_id } => validate_device_id(device_id),

            Request::DeviceSend { device_id, action } => {
                validate_device_id(device_id)?;
                validate_name(action)?;
                Ok(())
            }

            Request::SignalMapUpdate { payload, category, label, linked_devices } => {
                validate_payload(payload)?;
                validate_category(category)?;
                validate_name(label)?;
                if linked_devices.len() > MAX_LINKED_DEVICES {
                    return Err(format!(
                        "Too many linked devices: {} > {}",
                        linked_devices.len(),
                        MAX_LINKED_DEVICES
                    ));
                }
                for device_id in linked_devices {
                    validate_device_id(device_id)?;
                }
                Ok(())
            }

            Request::SignalMapDelete { payload } => validate_payload(payload),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Request::LearningStart => "LearningStart",
            Request::LearningStop => "LearningStop",
            Request::LearningStatus => "LearningStatus",
            Request::SignalsList => "SignalsList",
            Request::DeviceCreate { .. } => "DeviceCreate",
            Request::DeviceDelete { .. } => "DeviceDelete",
            Request::DeviceList => "DeviceList",
            Request::DeviceReload => "DeviceReload",
            Request::DeviceSend { .. } => "DeviceSend",
            Request::SignalMapList => "SignalMapList",
            Request::SignalMapUpdate { .. } => "SignalMapUpdate",
            Request::SignalMapDelete { .. } => "SignalMapDelete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to
    pub id: u64,
    /// The actual response
    #[serde(flatten)]
    pub response: Response,
}

impl ResponseEnvelope {
    pub fn new(id: u64, response: Response) -> Self {
        Self { id, response }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Response {
    #[serde(rename = "ok")]
    Ok(ResponseData),
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data - each variant has a unique structure that serde can distinguish
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DeviceInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<Vec<CapturedSignalInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<SignalMappingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Vec<SignalMappingInfo>>,
}

impl ResponseData {
    pub fn none() -> Self { Self::default() }
    pub fn learning(active: bool) -> Self { Self { active: Some(active), ..Self::default() } }
    pub fn device(d: DeviceInfo) -> Self { Self { device: Some(d), ..Self::default() } }
    pub fn device_list(d: Vec<DeviceInfo>) -> Self { Self { devices: Some(d), ..Self::default() } }
    pub fn signal_list(s: Vec<CapturedSignalInfo>) -> Self { Self { signals: Some(s), ..Self::default() } }
    pub fn mapping(m: SignalMappingInfo) -> Self { Self { mapping: Some(m), ..Self::default() } }
    pub fn mapping_list(m: Vec<SignalMappingInfo>) -> Self { Self { mappings: Some(m), ..Self::default() } }
}

impl Response {
    pub fn ok() -> Self {
        Response::Ok(ResponseData::none())
    }

    pub fn ok_learning(active: bool) -> Self {
        Response::Ok(ResponseData::learning(active))
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Response::Error { message: msg.into() }
    }
}

// ============================================================================
// Wire Representations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub signals: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMappingInfo {
    pub payload: String,
    pub category: String,
    pub label: String,
    #[serde(default)]
    pub linked_devices: Vec<String>,
}

/// One classification result attached to a captured signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInfo {
    /// Lower-case action names, sorted
    pub actions: Vec<String>,
    pub suggested_type: String,
}

/// One entry of the learning-mode capture log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedSignalInfo {
    pub payload: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationInfo>,
}

// ============================================================================
// Broadcast Events
// ============================================================================

/// Events pushed to subscribers over the three hub channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    /// Learning mode toggled
    LearningState { active: bool },
    /// A payload was captured while learning was active
    SignalObserved(CapturedSignalInfo),
    /// A payload matched a registered device's signal set
    DeviceSignal {
        device_id: String,
        action: String,
        payload: String,
    },
}

// ============================================================================
// Field Validators
// ============================================================================

pub fn validate_payload(payload: &str) -> Result<(), String> {
    if payload.is_empty() {
        return Err("Payload cannot be empty".into());
    }

    if payload.len() > MAX_PAYLOAD_LENGTH {
        return Err(format!(
            "Payload too long: {} > {} chars",
            payload.len(),
            MAX_PAYLOAD_LENGTH
        ));
    }

    for c in payload.chars() {
        if c.is_control() {
            return Err(format!("Payload contains control character: {:?}", c));
        }
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "Name too long: {} > {} chars",
            name.len(),
            MAX_NAME_LENGTH
        ));
    }

    Ok(())
}

pub fn validate_device_id(device_id: &str) -> Result<(), String> {
    if device_id.is_empty() {
        return Err("Device id cannot be empty".into());
    }

    if device_id.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "Device id too long: {} > {} chars",
            device_id.len(),
            MAX_NAME_LENGTH
        ));
    }

    for c in device_id.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(format!("Device id contains invalid character: {:?}", c));
        }
    }

    Ok(())
}

pub fn validate_device_type(device_type: &str) -> Result<(), String> {
    if !SUPPORTED_DEVICE_TYPES.contains(&device_type) {
        return Err(format!(
            "Unsupported device type {:?} (expected one of {:?})",
            device_type, SUPPORTED_DEVICE_TYPES
        ));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), String> {
    if !MAPPING_CATEGORIES.contains(&category) {
        return Err(format!(
            "Unknown mapping category {:?} (expected one of {:?})",
            category, MAPPING_CATEGORIES
        ));
    }
    Ok(())
}

pub fn validate_signals(signals: &BTreeMap<String, String>) -> Result<(), String> {
    if signals.is_empty() {
        return Err("Provide at least one signal mapping".into());
    }

    if signals.len() > MAX_SIGNALS_PER_DEVICE {
        return Err(format!(
            "Too many signals: {} > {}",
            signals.len(),
            MAX_SIGNALS_PER_DEVICE
        ));
    }

    for (label, payload) in signals {
        validate_name(label)?;
        validate_payload(payload)?;
    }

    Ok(())
}

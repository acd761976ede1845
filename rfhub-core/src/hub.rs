//! Learning/dispatch coordinator
//!
//! The hub owns the registry and the classifier, runs the learning-mode
//! state machine and fans inbound payloads out to subscribers. Inbound
//! dispatch only read-locks the registry, so it never waits on an
//! unrelated outbound transmit.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use rfhub_error::{Result, RfHubError};
use rfhub_protocol::{CapturedSignalInfo, ClassificationInfo, Event};

use crate::classify::{ActionTable, Classification, Classifier};
use crate::constants::limits;
use crate::data::{validate_device_signals, DeviceEntry, DeviceType, SignalMapping};
use crate::events::{EventBus, SubscriptionHandle};
use crate::registry::Registry;

/// External raw-transmit primitive (the RF gateway driver)
#[cfg_attr(test, mockall::automock)]
pub trait Transmitter: Send + Sync {
    fn send(&self, payload: &str) -> anyhow::Result<()>;
}

/// Capture-mode state; exists only between start and stop
#[derive(Debug, Default)]
struct LearningSession {
    active: bool,
    captured: Vec<CapturedSignalInfo>,
}

/// Coordinator for one configured gateway
pub struct Hub {
    registry: RwLock<Registry>,
    classifier: Classifier,
    transmitter: Arc<dyn Transmitter>,
    session: Mutex<LearningSession>,
    learning_events: EventBus<Event>,
    signal_events: EventBus<Event>,
    device_events: EventBus<Event>,
}

impl Hub {
    /// Build a hub over a loaded registry. The reference action table is
    /// built here, once, and handed to the classifier.
    pub fn new(registry: Registry, transmitter: Arc<dyn Transmitter>) -> Hub {
        let table = Arc::new(ActionTable::build());
        info!(fingerprints = table.len(), "Hub initialized");
        Hub {
            registry: RwLock::new(registry),
            classifier: Classifier::new(table),
            transmitter,
            session: Mutex::new(LearningSession::default()),
            learning_events: EventBus::new(),
            signal_events: EventBus::new(),
            device_events: EventBus::new(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    // ========================================================================
    // Learning state machine
    // ========================================================================

    /// Enter learning mode. Idempotent: calling while already learning
    /// changes nothing and emits no event.
    pub fn start_learning(&self) {
        {
            let mut session = self.session.lock();
            if session.active {
                return;
            }
            session.active = true;
            session.captured.clear();
        }
        info!("Learning mode started");
        self.learning_events.emit(&Event::LearningState { active: true });
    }

    /// Leave learning mode and discard the capture log. Idempotent.
    pub fn stop_learning(&self) {
        {
            let mut session = self.session.lock();
            if !session.active {
                return;
            }
            session.active = false;
            session.captured.clear();
        }
        info!("Learning mode stopped");
        self.learning_events.emit(&Event::LearningState { active: false });
    }

    pub fn is_learning(&self) -> bool {
        self.session.lock().active
    }

    /// Current capture log, oldest first
    pub fn list_signals(&self) -> Vec<CapturedSignalInfo> {
        self.session.lock().captured.clone()
    }

    // ========================================================================
    // Inbound dispatch
    // ========================================================================

    /// Handle one decoded payload from the receiver driver.
    ///
    /// While learning, the payload is logged and broadcast with its
    /// classification. In every state, all devices whose signal set
    /// contains the payload get one device-signal broadcast each; a
    /// payload matching nothing is dropped silently.
    pub fn on_payload(&self, payload: &str) {
        if payload.len() > limits::MAX_PAYLOAD_LENGTH {
            debug!(length = payload.len(), "Dropping oversized payload");
            return;
        }

        let observed = {
            let mut session = self.session.lock();
            if session.active {
                let entry = CapturedSignalInfo {
                    payload: payload.to_string(),
                    timestamp_ms: now_ms(),
                    classification: self
                        .classifier
                        .classify(payload)
                        .as_ref()
                        .map(classification_info),
                };
                if session.captured.len() >= limits::MAX_CAPTURED_SIGNALS {
                    // Keep the most recent captures
                    session.captured.remove(0);
                }
                session.captured.push(entry.clone());
                Some(entry)
            } else {
                None
            }
        };
        if let Some(entry) = observed {
            debug!(payload, "Captured signal while learning");
            self.signal_events.emit(&Event::SignalObserved(entry));
        }

        let matches = self.registry.read().matches_for_payload(payload);
        if matches.is_empty() {
            trace!(payload, "Payload matched no device");
            return;
        }
        for (device_id, action) in matches {
            debug!(device_id = %device_id, action = %action, "Device signal received");
            self.device_events.emit(&Event::DeviceSignal {
                device_id,
                action,
                payload: payload.to_string(),
            });
        }
    }

    // ========================================================================
    // Outbound routing
    // ========================================================================

    /// Resolve a device action to its stored payload and transmit it
    pub fn send_device_action(&self, device_id: &str, action: &str) -> Result<()> {
        let payload = {
            let registry = self.registry.read();
            let device = registry
                .device(device_id)
                .ok_or_else(|| RfHubError::unknown_device(device_id))?;
            device
                .signals
                .get(action)
                .cloned()
                .ok_or_else(|| RfHubError::unknown_action(device_id, action))?
        };

        debug!(device_id, action, "Transmitting device action");
        self.transmitter
            .send(&payload)
            .map_err(|e| RfHubError::TransmitFailure(format!("{e:#}")))
    }

    // ========================================================================
    // Device lifecycle
    // ========================================================================

    /// Validate, persist and return a new device. The signals mapping is
    /// checked against the device type before anything is written.
    pub fn create_device(
        &self,
        name: impl Into<String>,
        device_type: DeviceType,
        signals: BTreeMap<String, String>,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Result<DeviceEntry> {
        validate_device_signals(device_type, &signals)?;

        let entry = DeviceEntry {
            device_id: generate_device_id(),
            name: name.into(),
            device_type,
            signals,
            metadata,
        };
        self.registry.write().upsert_device(entry.clone())?;
        info!(device_id = %entry.device_id, device_type = %device_type, "Created device");
        Ok(entry)
    }

    pub fn get_device(&self, device_id: &str) -> Option<DeviceEntry> {
        self.registry.read().device(device_id).cloned()
    }

    pub fn list_devices(&self) -> Vec<DeviceEntry> {
        self.registry.read().all_devices().into_iter().cloned().collect()
    }

    pub fn devices_by_type(&self, device_type: DeviceType) -> Vec<DeviceEntry> {
        self.registry
            .read()
            .devices_by_type(device_type)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn remove_device(&self, device_id: &str) -> Result<bool> {
        self.registry.write().remove_device(device_id)
    }

    /// Re-read both stores from disk, replacing in-memory state
    pub fn reload_devices(&self) -> Result<()> {
        self.registry.write().load()
    }

    // ========================================================================
    // Signal mappings
    // ========================================================================

    /// Upsert payload metadata. The category string is validated at
    /// construction, before the store is touched.
    pub fn set_signal_mapping(
        &self,
        payload: impl Into<String>,
        category: &str,
        label: impl Into<String>,
        linked_devices: Vec<String>,
    ) -> Result<SignalMapping> {
        let mapping = SignalMapping::new(payload, category, label, linked_devices)?;
        self.registry.write().upsert_mapping(mapping.clone())?;
        Ok(mapping)
    }

    pub fn get_signal_mapping(&self, payload: &str) -> Option<SignalMapping> {
        self.registry.read().mapping(payload).cloned()
    }

    pub fn list_signal_mappings(&self) -> Vec<SignalMapping> {
        self.registry.read().all_mappings().into_iter().cloned().collect()
    }

    pub fn remove_signal_mapping(&self, payload: &str) -> Result<bool> {
        self.registry.write().remove_mapping(payload)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe_learning(
        &self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.learning_events.subscribe(callback)
    }

    pub fn unsubscribe_learning(&self, handle: SubscriptionHandle) {
        self.learning_events.unsubscribe(handle)
    }

    pub fn subscribe_signals(
        &self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.signal_events.subscribe(callback)
    }

    pub fn unsubscribe_signals(&self, handle: SubscriptionHandle) {
        self.signal_events.unsubscribe(handle)
    }

    pub fn subscribe_device_signals(
        &self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.device_events.subscribe(callback)
    }

    pub fn unsubscribe_device_signals(&self, handle: SubscriptionHandle) {
        self.device_events.unsubscribe(handle)
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("learning", &self.is_learning())
            .finish()
    }
}

/// Wire form of a classification: lower-case action names, sorted
pub fn classification_info(classification: &Classification) -> ClassificationInfo {
    let mut actions: Vec<String> = classification
        .actions
        .iter()
        .map(|a| a.name().to_string())
        .collect();
    actions.sort();
    ClassificationInfo {
        actions,
        suggested_type: classification.suggested_type.to_string(),
    }
}

/// Generate a v4-style GUID without a randomness dependency by mixing the
/// current timestamp
pub fn generate_device_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    // Format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
    let rand_part = timestamp ^ (timestamp >> 32);
    let rand2 = timestamp.wrapping_mul(0x5851F42D4C957F2D);
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (rand_part & 0xFFFFFFFF) as u32,
        ((rand_part >> 32) & 0xFFFF) as u16,
        ((rand2 >> 48) & 0x0FFF) as u16,
        (0x8000 | ((rand2 >> 32) & 0x3FFF)) as u16,
        (rand2 & 0xFFFFFFFFFFFF) as u64
    )
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hub_with(transmitter: Arc<dyn Transmitter>) -> (Hub, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        (Hub::new(registry, transmitter), dir)
    }

    fn noop_transmitter() -> Arc<dyn Transmitter> {
        let mut mock = MockTransmitter::new();
        mock.expect_send().returning(|_| Ok(()));
        Arc::new(mock)
    }

    fn switch_signals(on: &str, off: &str) -> BTreeMap<String, String> {
        let mut signals = BTreeMap::new();
        signals.insert("on".to_string(), on.to_string());
        signals.insert("off".to_string(), off.to_string());
        signals
    }

    #[test]
    fn test_start_learning_is_idempotent_and_emits_once() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = Arc::clone(&count);
            hub.subscribe_learning(move |event| {
                assert_eq!(event, &Event::LearningState { active: true });
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        hub.start_learning();
        hub.start_learning();

        assert!(hub.is_learning());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_learning_discards_capture_log() {
        let (hub, _dir) = hub_with(noop_transmitter());
        hub.start_learning();
        hub.on_payload("TXP:0,0,8,5600,320,2,1,3,3,1");
        assert_eq!(hub.list_signals().len(), 1);

        hub.stop_learning();
        assert!(!hub.is_learning());
        assert!(hub.list_signals().is_empty());
    }

    #[test]
    fn test_capture_log_is_chronological() {
        let (hub, _dir) = hub_with(noop_transmitter());
        hub.start_learning();
        hub.on_payload("first");
        hub.on_payload("second");

        let signals = hub.list_signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].payload, "first");
        assert_eq!(signals[1].payload, "second");
        assert!(signals[0].timestamp_ms <= signals[1].timestamp_ms);
    }

    #[test]
    fn test_oversized_payload_is_dropped() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let matched = Arc::new(AtomicUsize::new(0));
        {
            let matched = Arc::clone(&matched);
            hub.subscribe_device_signals(move |_| {
                matched.fetch_add(1, Ordering::SeqCst);
            });
        }

        let oversized = "1,".repeat(limits::MAX_PAYLOAD_LENGTH);
        hub.create_device(
            "Lamp",
            DeviceType::Switch,
            switch_signals(&oversized, "B"),
            BTreeMap::new(),
        )
        .unwrap();

        hub.start_learning();
        hub.on_payload(&oversized);

        assert!(hub.list_signals().is_empty());
        assert_eq!(matched.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_payloads_ignored_when_not_learning() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let observed = Arc::new(AtomicUsize::new(0));
        {
            let observed = Arc::clone(&observed);
            hub.subscribe_signals(move |_| {
                observed.fetch_add(1, Ordering::SeqCst);
            });
        }

        hub.on_payload("TXP:0,0,8,5600,320,2,1,3,3,1");
        assert!(hub.list_signals().is_empty());
        assert_eq!(observed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_fans_out_to_all_matching_devices() {
        let (hub, _dir) = hub_with(noop_transmitter());
        hub.create_device("A", DeviceType::Switch, switch_signals("X", "X-off"), BTreeMap::new())
            .unwrap();
        hub.create_device("B", DeviceType::Switch, switch_signals("X", "other"), BTreeMap::new())
            .unwrap();

        let events: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let events = Arc::clone(&events);
            hub.subscribe_device_signals(move |event| {
                events.lock().push(event.clone());
            });
        }

        hub.on_payload("X");

        let events = events.lock();
        assert_eq!(events.len(), 2);
        let mut device_ids: Vec<String> = events
            .iter()
            .map(|e| match e {
                Event::DeviceSignal { device_id, action, payload } => {
                    assert_eq!(action, "on");
                    assert_eq!(payload, "X");
                    device_id.clone()
                }
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        device_ids.sort();
        device_ids.dedup();
        assert_eq!(device_ids.len(), 2);
    }

    #[test]
    fn test_unmatched_payload_is_dropped() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = Arc::clone(&count);
            hub.subscribe_device_signals(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        hub.on_payload("noise");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_send_device_action_errors() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let device = hub
            .create_device("Lamp", DeviceType::Switch, switch_signals("A", "B"), BTreeMap::new())
            .unwrap();

        assert!(matches!(
            hub.send_device_action("missing-id", "on"),
            Err(RfHubError::UnknownDevice(_))
        ));
        assert!(matches!(
            hub.send_device_action(&device.device_id, "bogus-action"),
            Err(RfHubError::UnknownAction { .. })
        ));
        assert!(hub.send_device_action(&device.device_id, "on").is_ok());
    }

    #[test]
    fn test_send_device_action_transmits_stored_payload() {
        let mut mock = MockTransmitter::new();
        mock.expect_send()
            .withf(|payload| payload == "A")
            .times(1)
            .returning(|_| Ok(()));
        let (hub, _dir) = hub_with(Arc::new(mock));

        let device = hub
            .create_device("Lamp", DeviceType::Switch, switch_signals("A", "B"), BTreeMap::new())
            .unwrap();
        hub.send_device_action(&device.device_id, "on").unwrap();
    }

    #[test]
    fn test_transmit_failure_is_propagated() {
        let mut mock = MockTransmitter::new();
        mock.expect_send()
            .returning(|_| Err(anyhow::anyhow!("serial port gone")));
        let (hub, _dir) = hub_with(Arc::new(mock));

        let device = hub
            .create_device("Lamp", DeviceType::Switch, switch_signals("A", "B"), BTreeMap::new())
            .unwrap();
        let err = hub.send_device_action(&device.device_id, "on").unwrap_err();
        match err {
            RfHubError::TransmitFailure(msg) => assert!(msg.contains("serial port gone")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_device_validates_before_persisting() {
        let (hub, _dir) = hub_with(noop_transmitter());

        let only_on: BTreeMap<String, String> =
            [("on".to_string(), "A".to_string())].into_iter().collect();
        assert!(matches!(
            hub.create_device("Lamp", DeviceType::Switch, only_on, BTreeMap::new()),
            Err(RfHubError::InvalidSignalMapping { .. })
        ));
        assert!(hub.list_devices().is_empty());
    }

    #[test]
    fn test_created_device_is_retrievable() {
        let (hub, _dir) = hub_with(noop_transmitter());
        let device = hub
            .create_device("Lamp", DeviceType::Switch, switch_signals("A", "B"), BTreeMap::new())
            .unwrap();
        assert_eq!(hub.get_device(&device.device_id), Some(device));
    }

    #[test]
    fn test_invalid_mapping_category_never_reaches_store() {
        let (hub, _dir) = hub_with(noop_transmitter());
        assert!(matches!(
            hub.set_signal_mapping("X", "spaceship", "Porch", vec![]),
            Err(RfHubError::InvalidMappingCategory(_))
        ));
        assert!(hub.list_signal_mappings().is_empty());
    }

    #[test]
    fn test_generated_device_ids_look_like_guids() {
        let id = generate_device_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].starts_with('4'));
    }
}

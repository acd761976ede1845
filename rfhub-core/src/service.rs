//! Command dispatch for the UI-facing channel
//!
//! Maps protocol requests onto hub operations. The transport itself lives
//! outside this crate; callers hand in one JSON-encoded request line and
//! get a response envelope back.

use std::str::FromStr;

use tracing::{debug, warn};

use rfhub_protocol::{
    DeviceInfo, Request, RequestEnvelope, Response, ResponseData, ResponseEnvelope,
    SignalMappingInfo,
};

use crate::data::{DeviceEntry, DeviceType, SignalMapping};
use crate::hub::Hub;

/// Parse, validate and dispatch a single request line
pub fn process_request(hub: &Hub, line: &str) -> ResponseEnvelope {
    let envelope: RequestEnvelope = match serde_json::from_str(line.trim()) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Invalid request JSON");
            return ResponseEnvelope::new(0, Response::error("Invalid request format"));
        }
    };

    let request_id = envelope.id;
    let request = envelope.request;

    if let Err(e) = request.validate() {
        warn!(request = request.type_name(), error = %e, "Request validation failed");
        return ResponseEnvelope::new(request_id, Response::error(e));
    }

    debug!(request = request.type_name(), id = request_id, "Processing request");
    ResponseEnvelope::new(request_id, dispatch(hub, request))
}

/// Execute one validated request against the hub
pub fn dispatch(hub: &Hub, request: Request) -> Response {
    match request {
        Request::LearningStart => {
            hub.start_learning();
            Response::ok_learning(true)
        }

        Request::LearningStop => {
            hub.stop_learning();
            Response::ok_learning(false)
        }

        Request::LearningStatus => Response::ok_learning(hub.is_learning()),

        Request::SignalsList => Response::Ok(ResponseData::signal_list(hub.list_signals())),

        Request::DeviceCreate { name, device_type, signals, metadata } => {
            let device_type = match DeviceType::from_str(&device_type) {
                Ok(device_type) => device_type,
                Err(e) => return Response::error(e.to_string()),
            };
            match hub.create_device(name, device_type, signals, metadata) {
                Ok(entry) => Response::Ok(ResponseData::device(device_info(&entry))),
                Err(e) => Response::error(e.to_string()),
            }
        }

        Request::DeviceDelete { device_id } => match hub.remove_device(&device_id) {
            Ok(true) => Response::ok(),
            Ok(false) => Response::error(format!("Unknown device: {device_id}")),
            Err(e) => Response::error(e.to_string()),
        },

        Request::DeviceList => Response::Ok(ResponseData::device_list(
            hub.list_devices().iter().map(device_info).collect(),
        )),

        Request::DeviceReload => match hub.reload_devices() {
            Ok(()) => Response::ok(),
            Err(e) => Response::error(e.to_string()),
        },

        Request::DeviceSend { device_id, action } => {
            match hub.send_device_action(&device_id, &action) {
                Ok(()) => Response::ok(),
                Err(e) => Response::error(e.to_string()),
            }
        }

        Request::SignalMapList => Response::Ok(ResponseData::mapping_list(
            hub.list_signal_mappings().iter().map(mapping_info).collect(),
        )),

        Request::SignalMapUpdate { payload, category, label, linked_devices } => {
            match hub.set_signal_mapping(payload, &category, label, linked_devices) {
                Ok(mapping) => Response::Ok(ResponseData::mapping(mapping_info(&mapping))),
                Err(e) => Response::error(e.to_string()),
            }
        }

        Request::SignalMapDelete { payload } => match hub.remove_signal_mapping(&payload) {
            Ok(true) => Response::ok(),
            Ok(false) => Response::error("Unknown signal mapping".to_string()),
            Err(e) => Response::error(e.to_string()),
        },
    }
}

fn device_info(entry: &DeviceEntry) -> DeviceInfo {
    DeviceInfo {
        device_id: entry.device_id.clone(),
        name: entry.name.clone(),
        device_type: entry.device_type.to_string(),
        signals: entry.signals.clone(),
        metadata: entry.metadata.clone(),
    }
}

fn mapping_info(mapping: &SignalMapping) -> SignalMappingInfo {
    SignalMappingInfo {
        payload: mapping.payload.clone(),
        category: mapping.category.to_string(),
        label: mapping.label.clone(),
        linked_devices: mapping.linked_devices.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{MockTransmitter, Transmitter};
    use crate::registry::Registry;
    use std::sync::Arc;

    fn test_hub() -> (Hub, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTransmitter::new();
        mock.expect_send().returning(|_| Ok(()));
        let transmitter: Arc<dyn Transmitter> = Arc::new(mock);
        (Hub::new(Registry::new(dir.path()), transmitter), dir)
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let (hub, _dir) = test_hub();
        let response = process_request(&hub, "{nope");
        assert_eq!(response.id, 0);
        assert!(matches!(response.response, Response::Error { .. }));
    }

    #[test]
    fn test_validation_failure_short_circuits() {
        let (hub, _dir) = test_hub();
        let line = r#"{"id":7,"cmd":"DeviceSend","data":{"device_id":"bad/id","action":"on"}}"#;
        let response = process_request(&hub, line);
        assert_eq!(response.id, 7);
        assert!(matches!(response.response, Response::Error { .. }));
    }

    #[test]
    fn test_learning_round_trip_via_requests() {
        let (hub, _dir) = test_hub();

        let response = dispatch(&hub, Request::LearningStart);
        match response {
            Response::Ok(data) => assert_eq!(data.active, Some(true)),
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(hub.is_learning());

        let response = dispatch(&hub, Request::LearningStatus);
        match response {
            Response::Ok(data) => assert_eq!(data.active, Some(true)),
            other => panic!("unexpected response: {other:?}"),
        }

        dispatch(&hub, Request::LearningStop);
        assert!(!hub.is_learning());
    }

    #[test]
    fn test_device_create_and_list() {
        let (hub, _dir) = test_hub();
        let line = r#"{
            "id": 1,
            "cmd": "DeviceCreate",
            "data": {
                "name": "Lamp",
                "device_type": "switch",
                "signals": {"on": "A", "off": "B"}
            }
        }"#;
        let response = process_request(&hub, line);
        let created = match response.response {
            Response::Ok(data) => data.device.expect("device in response"),
            other => panic!("unexpected response: {other:?}"),
        };
        assert_eq!(created.device_type, "switch");

        let response = dispatch(&hub, Request::DeviceList);
        match response {
            Response::Ok(data) => {
                let devices = data.devices.expect("device list");
                assert_eq!(devices.len(), 1);
                assert_eq!(devices[0].device_id, created.device_id);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_device_create_reports_signal_violation() {
        let (hub, _dir) = test_hub();
        let response = dispatch(
            &hub,
            Request::DeviceCreate {
                name: "Lamp".to_string(),
                device_type: "switch".to_string(),
                signals: [("on".to_string(), "A".to_string())].into_iter().collect(),
                metadata: Default::default(),
            },
        );
        match response {
            Response::Error { message } => assert!(message.contains("off")),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_mapping_update_and_delete() {
        let (hub, _dir) = test_hub();
        let response = dispatch(
            &hub,
            Request::SignalMapUpdate {
                payload: "X".to_string(),
                category: "doorbell".to_string(),
                label: "Front door".to_string(),
                linked_devices: vec![],
            },
        );
        assert!(matches!(response, Response::Ok(_)));

        let response = dispatch(&hub, Request::SignalMapDelete { payload: "X".to_string() });
        assert!(matches!(response, Response::Ok(_)));

        let response = dispatch(&hub, Request::SignalMapDelete { payload: "X".to_string() });
        assert!(matches!(response, Response::Error { .. }));
    }
}

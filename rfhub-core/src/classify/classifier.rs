//! Payload classification
//!
//! Combines fingerprint extraction with a reference table lookup and
//! infers a suggested device type from the matched action set.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::data::DeviceType;
use crate::vendor::Action;

use super::fingerprint::SignalFingerprint;
use super::table::ActionTable;

/// Result of classifying one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub actions: BTreeSet<Action>,
    pub suggested_type: DeviceType,
}

/// Matches payloads against a prebuilt reference table.
///
/// Holds a shared handle to the table; the table is built once by the
/// owning hub and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<ActionTable>,
}

impl Classifier {
    pub fn new(table: Arc<ActionTable>) -> Classifier {
        Classifier { table }
    }

    /// Classify a raw payload. `None` means "shape unknown", covering both
    /// malformed payloads and well-formed shapes absent from the table.
    pub fn classify(&self, payload: &str) -> Option<Classification> {
        let fingerprint = SignalFingerprint::from_payload(payload)?;
        let actions = self.table.lookup(&fingerprint)?;
        let suggested_type = infer_device_type(actions);
        trace!(?fingerprint, ?suggested_type, "Classified payload");
        Some(Classification {
            actions: actions.clone(),
            suggested_type,
        })
    }
}

/// Infer the device type suggested by an action set.
///
/// Checked in priority order: dimmable shapes win over plain toggles, a
/// bare ON or a pairing action suggests a stateless button, and anything
/// else falls through to universal.
pub fn infer_device_type(actions: &BTreeSet<Action>) -> DeviceType {
    if actions.contains(&Action::Bright) || actions.contains(&Action::Dim) {
        DeviceType::Light
    } else if actions.contains(&Action::On) && actions.contains(&Action::Off) {
        DeviceType::Switch
    } else if actions.len() == 1 && actions.contains(&Action::On) {
        DeviceType::Button
    } else if actions.contains(&Action::Pair) || actions.contains(&Action::Unpair) {
        DeviceType::Button
    } else {
        DeviceType::Universal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(list: &[Action]) -> BTreeSet<Action> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_dimmable_beats_toggle() {
        assert_eq!(
            infer_device_type(&actions(&[Action::On, Action::Off, Action::Dim])),
            DeviceType::Light
        );
        assert_eq!(
            infer_device_type(&actions(&[Action::Bright])),
            DeviceType::Light
        );
    }

    #[test]
    fn test_on_off_is_switch() {
        assert_eq!(
            infer_device_type(&actions(&[Action::On, Action::Off])),
            DeviceType::Switch
        );
    }

    #[test]
    fn test_bare_on_is_button() {
        assert_eq!(infer_device_type(&actions(&[Action::On])), DeviceType::Button);
    }

    #[test]
    fn test_pairing_is_button() {
        assert_eq!(
            infer_device_type(&actions(&[Action::Pair, Action::Unpair])),
            DeviceType::Button
        );
    }

    #[test]
    fn test_fallthrough_is_universal() {
        assert_eq!(infer_device_type(&actions(&[Action::Off])), DeviceType::Universal);
    }

    #[test]
    fn test_classifier_returns_none_for_garbage() {
        let classifier = Classifier::new(Arc::new(ActionTable::build()));
        assert!(classifier.classify("not a payload").is_none());
        assert!(classifier.classify("TXP:0,0,x,5600,320,2,1,3,3,1").is_none());
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let classifier = Classifier::new(Arc::new(ActionTable::build()));
        let unit = crate::vendor::library()
            .iter()
            .find(|u| u.model == "AB440S")
            .expect("catalog entry");
        let config = unit.default_channel_config().expect("config");
        let payload = unit
            .pulse_data(&config, Action::On)
            .expect("pulse data")
            .payload();

        let first = classifier.classify(&payload).expect("classification");
        let second = classifier.classify(&payload).expect("classification");
        assert_eq!(first, second);
        assert_eq!(first.suggested_type, DeviceType::Switch);
    }
}

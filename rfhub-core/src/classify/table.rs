//! Reference action table
//!
//! Maps fingerprints to the set of actions that could have produced them.
//! Built once by enumerating every catalog unit under its deterministic
//! default channel configuration; channel values never change the pulse
//! shape, so one fingerprint can cover many physical channels and, across
//! protocols that share a shape, several actions.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::vendor::{self, Action};

use super::fingerprint::SignalFingerprint;

/// Immutable fingerprint to action-set table
#[derive(Debug, Default)]
pub struct ActionTable {
    entries: HashMap<SignalFingerprint, BTreeSet<Action>>,
}

impl ActionTable {
    /// Build the table from the static control-unit catalog.
    ///
    /// A unit or action that fails to generate pulse data is logged and
    /// skipped; one bad catalog entry never suppresses the rest.
    pub fn build() -> ActionTable {
        let mut entries: HashMap<SignalFingerprint, BTreeSet<Action>> = HashMap::new();

        for unit in vendor::library() {
            let config = match unit.default_channel_config() {
                Ok(config) => config,
                Err(e) => {
                    debug!(
                        manufacturer = unit.manufacturer,
                        model = unit.model,
                        error = %e,
                        "Skipping control unit with unusable default config"
                    );
                    continue;
                }
            };

            for &action in unit.actions {
                let train = match unit.pulse_data(&config, action) {
                    Ok(train) => train,
                    Err(e) => {
                        debug!(
                            manufacturer = unit.manufacturer,
                            model = unit.model,
                            action = %action,
                            error = %e,
                            "Skipping action with no pulse data"
                        );
                        continue;
                    }
                };
                let Some(fingerprint) = SignalFingerprint::from_pulse_train(&train) else {
                    debug!(
                        manufacturer = unit.manufacturer,
                        model = unit.model,
                        action = %action,
                        "Skipping action with empty pulse train"
                    );
                    continue;
                };
                entries.entry(fingerprint).or_default().insert(action);
            }
        }

        info!(fingerprints = entries.len(), "Built reference action table");
        ActionTable { entries }
    }

    pub fn lookup(&self, fingerprint: &SignalFingerprint) -> Option<&BTreeSet<Action>> {
        self.entries.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Device and mapping registry
//!
//! Owns the in-memory view of both persisted collections and is the only
//! writer of the backing stores. Every mutation rewrites the full
//! collection before returning, so a completed call is durable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use rfhub_error::Result;

use crate::constants::paths;
use crate::data::persistence;
use crate::data::{DeviceEntry, DeviceType, SignalMapping};

/// Persistent registry of devices and signal mappings.
///
/// Collections are keyed maps, so iteration order is the key order and
/// stays deterministic across calls within a process run.
#[derive(Debug)]
pub struct Registry {
    data_dir: PathBuf,
    devices: BTreeMap<String, DeviceEntry>,
    mappings: BTreeMap<String, SignalMapping>,
}

impl Registry {
    /// Create an empty registry rooted at `data_dir` without touching disk
    pub fn new(data_dir: impl Into<PathBuf>) -> Registry {
        Registry {
            data_dir: data_dir.into(),
            devices: BTreeMap::new(),
            mappings: BTreeMap::new(),
        }
    }

    /// Create a registry at the default data directory and load it
    pub fn open_default() -> Result<Registry> {
        let mut registry = Registry::new(paths::data_dir());
        registry.load()?;
        Ok(registry)
    }

    /// Replace in-memory state with persisted content. Missing store files
    /// yield empty collections.
    pub fn load(&mut self) -> Result<()> {
        let devices = persistence::load_devices(&self.device_store_path())?;
        let mappings = persistence::load_mappings(&self.mapping_store_path())?;

        self.devices = devices
            .into_iter()
            .map(|d| (d.device_id.clone(), d))
            .collect();
        self.mappings = mappings
            .into_iter()
            .map(|m| (m.payload.clone(), m))
            .collect();

        info!(
            devices = self.devices.len(),
            mappings = self.mappings.len(),
            "Registry loaded"
        );
        Ok(())
    }

    fn device_store_path(&self) -> PathBuf {
        self.data_dir.join(paths::DEVICE_STORE_FILE)
    }

    fn mapping_store_path(&self) -> PathBuf {
        self.data_dir.join(paths::MAPPING_STORE_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ========================================================================
    // Devices
    // ========================================================================

    pub fn device(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.get(device_id)
    }

    pub fn all_devices(&self) -> Vec<&DeviceEntry> {
        self.devices.values().collect()
    }

    pub fn devices_by_type(&self, device_type: DeviceType) -> Vec<&DeviceEntry> {
        self.devices
            .values()
            .filter(|d| d.device_type == device_type)
            .collect()
    }

    /// All (device_id, action_label) pairs whose stored signal equals
    /// `payload`. Several devices may share one payload.
    pub fn matches_for_payload(&self, payload: &str) -> Vec<(String, String)> {
        let mut matches = Vec::new();
        for device in self.devices.values() {
            for (action, stored) in &device.signals {
                if stored == payload {
                    matches.push((device.device_id.clone(), action.clone()));
                }
            }
        }
        matches
    }

    /// Insert or fully replace a device, then persist the device list
    pub fn upsert_device(&mut self, entry: DeviceEntry) -> Result<()> {
        debug!(device_id = %entry.device_id, "Upserting device");
        self.devices.insert(entry.device_id.clone(), entry);
        self.flush_devices()
    }

    /// Remove a device. Persists only when something was actually removed.
    pub fn remove_device(&mut self, device_id: &str) -> Result<bool> {
        if self.devices.remove(device_id).is_none() {
            return Ok(false);
        }
        debug!(device_id, "Removed device");
        self.flush_devices()?;
        Ok(true)
    }

    fn flush_devices(&self) -> Result<()> {
        let devices: Vec<DeviceEntry> = self.devices.values().cloned().collect();
        persistence::save_devices(&self.device_store_path(), &devices)
    }

    // ========================================================================
    // Signal mappings
    // ========================================================================

    pub fn mapping(&self, payload: &str) -> Option<&SignalMapping> {
        self.mappings.get(payload)
    }

    pub fn all_mappings(&self) -> Vec<&SignalMapping> {
        self.mappings.values().collect()
    }

    /// Insert or fully replace a mapping keyed by payload, then persist
    pub fn upsert_mapping(&mut self, mapping: SignalMapping) -> Result<()> {
        debug!(payload = %mapping.payload, category = %mapping.category, "Upserting mapping");
        self.mappings.insert(mapping.payload.clone(), mapping);
        self.flush_mappings()
    }

    pub fn remove_mapping(&mut self, payload: &str) -> Result<bool> {
        if self.mappings.remove(payload).is_none() {
            return Ok(false);
        }
        debug!(payload, "Removed mapping");
        self.flush_mappings()?;
        Ok(true)
    }

    fn flush_mappings(&self) -> Result<()> {
        let mappings: Vec<SignalMapping> = self.mappings.values().cloned().collect();
        persistence::save_mappings(&self.mapping_store_path(), &mappings)
    }
}

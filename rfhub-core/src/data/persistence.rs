//! JSON persistence for devices and signal mappings
//!
//! Two independent stores, each a single JSON document rewritten wholesale
//! on every mutation. A missing file means an empty collection; a failed
//! save is surfaced to the caller, never swallowed.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rfhub_error::{Result, RfHubError};

use crate::constants::limits;

use super::types::{DeviceEntry, SignalMapping};

/// On-disk shape of the device store
#[derive(Debug, Default, Serialize, Deserialize)]
struct DeviceStoreFile {
    #[serde(default)]
    devices: Vec<DeviceEntry>,
}

/// On-disk shape of the mapping store
#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingStoreFile {
    #[serde(default)]
    mappings: Vec<SignalMapping>,
}

pub fn load_devices(path: &Path) -> Result<Vec<DeviceEntry>> {
    let store: DeviceStoreFile = load_store(path)?;
    info!(count = store.devices.len(), path = %path.display(), "Loaded device store");
    Ok(store.devices)
}

pub fn save_devices(path: &Path, devices: &[DeviceEntry]) -> Result<()> {
    save_store(
        path,
        &DeviceStoreFile {
            devices: devices.to_vec(),
        },
    )?;
    debug!(count = devices.len(), path = %path.display(), "Saved device store");
    Ok(())
}

pub fn load_mappings(path: &Path) -> Result<Vec<SignalMapping>> {
    let store: MappingStoreFile = load_store(path)?;
    info!(count = store.mappings.len(), path = %path.display(), "Loaded mapping store");
    Ok(store.mappings)
}

pub fn save_mappings(path: &Path, mappings: &[SignalMapping]) -> Result<()> {
    save_store(
        path,
        &MappingStoreFile {
            mappings: mappings.to_vec(),
        },
    )?;
    debug!(count = mappings.len(), path = %path.display(), "Saved mapping store");
    Ok(())
}

fn load_store<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "No store file found, starting empty");
        return Ok(T::default());
    }

    let metadata = fs::metadata(path).map_err(|e| RfHubError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.len() > limits::MAX_STORE_SIZE {
        return Err(RfHubError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: limits::MAX_STORE_SIZE,
        });
    }

    let contents = fs::read_to_string(path).map_err(|e| RfHubError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn save_store<T: Serialize>(path: &Path, store: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(store)?;

    // Atomic write: temp file, fsync, rename
    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path).map_err(|e| RfHubError::FileWrite {
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(json.as_bytes())
        .map_err(|e| RfHubError::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;
    file.sync_all().map_err(|e| RfHubError::FileWrite {
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| RfHubError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

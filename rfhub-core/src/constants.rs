//! Constants and configuration values for rfhub
//!
//! Centralizes magic numbers, store paths, and transport framing defaults.
//! Never use magic numbers in other files - add them here first.

/// Gateway transport framing
pub mod transport {
    /// Gap between frame repetitions in microseconds.
    ///
    /// The gateway always injects this constant gap when transmitting, so
    /// fingerprints are built with it on both the table side and the
    /// runtime side regardless of what a received payload advertises.
    pub const FIXED_GAP_US: u32 = 5600;

    /// Minimum number of comma tokens before the pulse section starts
    /// (two framing fields, repetitions, gap, timebase, pair count)
    pub const MIN_HEADER_TOKENS: usize = 6;

    /// Token index of the repetition count in a payload body
    pub const TOKEN_REPETITIONS: usize = 2;
    /// Token index of the advertised inter-frame gap
    pub const TOKEN_GAP: usize = 3;
    /// Token index of the timebase in microseconds
    pub const TOKEN_TIMEBASE: usize = 4;
    /// Token index of the pulse-pair count
    pub const TOKEN_PAIR_COUNT: usize = 5;
}

/// Store locations
pub mod paths {
    use std::path::PathBuf;

    /// Device registry document
    pub const DEVICE_STORE_FILE: &str = "devices.json";

    /// Signal mapping metadata document
    pub const MAPPING_STORE_FILE: &str = "signal_mappings.json";

    /// Environment override for the data directory (used by tests and
    /// deployments that keep state outside the user config dir)
    pub const DATA_DIR_ENV: &str = "RFHUB_DATA_DIR";

    /// Resolve the hub data directory.
    ///
    /// Honors `RFHUB_DATA_DIR`, then falls back to the platform config
    /// directory, then to a relative `rfhub` directory.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rfhub")
    }
}

/// Size limits for stores and payloads
pub mod limits {
    /// Maximum store document size (10 MB)
    pub const MAX_STORE_SIZE: u64 = 10 * 1024 * 1024;

    /// Maximum raw payload length accepted by the hub
    pub const MAX_PAYLOAD_LENGTH: usize = 4096;

    /// Maximum captured signals retained per learning session
    pub const MAX_CAPTURED_SIGNALS: usize = 256;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_gap_matches_gateway_constant() {
        assert_eq!(transport::FIXED_GAP_US, 5600);
    }

    #[test]
    fn test_data_dir_env_override() {
        std::env::set_var(paths::DATA_DIR_ENV, "/tmp/rfhub-test-dir");
        assert_eq!(
            paths::data_dir(),
            std::path::PathBuf::from("/tmp/rfhub-test-dir")
        );
        std::env::remove_var(paths::DATA_DIR_ENV);
    }
}

//! Application configuration
//!
//! Persistent settings for the serial link and the acquisition pipeline.
//! The config is stored as JSON in the platform data directory under
//! `pulsevis-rs/` and loaded once at startup; missing or corrupt files
//! fall back to defaults with a logged warning.

use crate::error::{PulseVisError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier used for the data directory
pub const APP_ID: &str = "pulsevis-rs";

/// File name of the persisted configuration
pub const CONFIG_FILE: &str = "config.json";

/// Default serial baud rate (fixed by the sensor firmware)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default serial read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default capacity of the producer/consumer sample queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 300;

/// Default number of points kept in the scrolling window
pub const DEFAULT_WINDOW_SIZE: usize = 200;

/// Default redraw tick rate in Hz
pub const DEFAULT_TICK_RATE_HZ: u32 = 50;

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        PulseVisError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            PulseVisError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Parity setting for the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Serial link parameters
///
/// The pulse sensor speaks fixed 9600/8/N/1; these stay configurable so a
/// different firmware build can be accommodated without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits per character (5-8)
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// Parity bit setting
    #[serde(default)]
    pub parity: Parity,

    /// Stop bits (1 or 2)
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,

    /// Read timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    /// Read timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Parameters of the ingestion and rendering pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Capacity of the bounded sample queue between reader and renderer.
    /// The reader blocks when the queue is full (backpressure).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of points visible in the scrolling waveform window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Redraw tick rate in Hz, independent of sample arrival
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Upper bound on a single transport read, in bytes
    #[serde(default = "default_max_read_chunk")]
    pub max_read_chunk: usize,

    /// How long the reader sleeps when the transport has no pending bytes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_tick_rate_hz() -> u32 {
    DEFAULT_TICK_RATE_HZ
}

fn default_max_read_chunk() -> usize {
    1024
}

fn default_poll_interval_ms() -> u64 {
    2
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            window_size: DEFAULT_WINDOW_SIZE,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            max_read_chunk: default_max_read_chunk(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AcquisitionConfig {
    /// Interval between redraw ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    /// Reader sleep interval when the transport is idle
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Serial link parameters
    #[serde(default)]
    pub serial: SerialConfig,

    /// Ingestion/rendering pipeline parameters
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

impl AppConfig {
    /// Load the configuration from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PulseVisError::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| PulseVisError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load the configuration from the default location
    pub fn load() -> Result<Self> {
        let path = app_data_dir()
            .map(|p| p.join(CONFIG_FILE))
            .ok_or_else(|| PulseVisError::Config("Could not determine config path".to_string()))?;
        Self::load_from(path)
    }

    /// Load the configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PulseVisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| PulseVisError::Config(format!("Failed to write config: {}", e)))
    }

    /// Save the configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.serial.parity, Parity::None);
        assert_eq!(config.serial.stop_bits, 1);
        assert_eq!(config.serial.timeout_ms, 1000);
        assert_eq!(config.acquisition.queue_capacity, 300);
        assert_eq!(config.acquisition.window_size, 200);
        assert_eq!(config.acquisition.tick_rate_hz, 50);
    }

    #[test]
    fn test_tick_interval() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.serial.baud_rate = 115_200;
        config.acquisition.window_size = 400;
        config.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.serial.baud_rate, 115_200);
        assert_eq!(loaded.acquisition.window_size, 400);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = AppConfig::load_from(dir.path().join("nope.json")).expect("load");
        assert_eq!(loaded.serial.baud_rate, DEFAULT_BAUD_RATE);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"serial": {"baud_rate": 57600}}"#).expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.serial.baud_rate, 57600);
        assert_eq!(loaded.serial.data_bits, 8);
        assert_eq!(loaded.acquisition.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }
}

//! Reader configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via VEDIRECT_CONFIG or --config)
//! 3. Environment variables

use crate::discovery::DEFAULT_ATTEMPTS;
use crate::error::VedirectError;
use crate::reader::ReadOptions;
use crate::serial_test::{RawSuite, SerialTestEvaluator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vedirect_protocol::{is_label_byte, DecoderConfig};
use vedirect_serial::{is_valid_port_name, list_ports, SerialSettings};

/// Reader configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link settings.
    pub serial: SerialSettings,
    /// Read loop bounds.
    pub read: ReadConfig,
    /// Frame decoder settings.
    pub decoder: DecoderSettings,
    /// Port discovery settings.
    pub discovery: DiscoveryConfig,
    /// Serial tests identifying the expected device.
    pub serial_tests: RawSuite,
}

impl Config {
    /// Loads configuration from VEDIRECT_CONFIG if set, then applies
    /// environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from `path`, falling back to VEDIRECT_CONFIG,
    /// then applies environment variable overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("VEDIRECT_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        apply_serial_env_overrides(&mut self.serial);
        self.read.apply_env_overrides();
        self.decoder.apply_env_overrides();
        self.discovery.apply_env_overrides();
    }

    /// Checks serial settings, decoder settings, discovery settings and the
    /// serial test suite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.serial
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("serial: {e}")))?;
        self.decoder.decoder_config()?;
        self.discovery.validate()?;
        SerialTestEvaluator::validate(&self.serial_tests)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// Builds an evaluator holding the configured serial tests.
    pub fn evaluator(&self) -> Result<SerialTestEvaluator, ConfigError> {
        SerialTestEvaluator::from_raw(&self.serial_tests)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

fn apply_serial_env_overrides(serial: &mut SerialSettings) {
    if let Ok(port) = std::env::var("VEDIRECT_PORT") {
        serial.port = port;
    }

    if let Ok(baud) = std::env::var("VEDIRECT_BAUD") {
        if let Ok(n) = baud.parse() {
            serial.baud = n;
        }
    }

    if let Ok(timeout) = std::env::var("VEDIRECT_SERIAL_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse() {
            serial.timeout_ms = ms;
        }
    }
}

/// Read loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Time budget of one read loop in milliseconds.
    pub timeout_ms: u64,
    /// Records delivered per read loop. 0 means unbounded.
    pub max_loops: u32,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_loops: 1,
        }
    }
}

impl ReadConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("VEDIRECT_READ_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.timeout_ms = ms;
            }
        }

        if let Ok(loops) = std::env::var("VEDIRECT_MAX_LOOPS") {
            if let Ok(n) = loops.parse() {
                self.max_loops = n;
            }
        }
    }

    /// Returns read timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn options(&self) -> ReadOptions {
        let options = ReadOptions::new(self.timeout());
        match self.max_loops {
            0 => options.unbounded(),
            n => options.with_max_loops(n),
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// Single ASCII character opening a hex sub-frame. Empty disables hex
    /// sub-frame detection.
    pub hex_marker: String,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            hex_marker: ":".to_string(),
        }
    }
}

impl DecoderSettings {
    fn apply_env_overrides(&mut self) {
        if let Ok(marker) = std::env::var("VEDIRECT_HEX_MARKER") {
            self.hex_marker = marker;
        }
    }

    /// Converts to decoder settings. The marker must be a printable
    /// character that cannot start a label.
    pub fn decoder_config(&self) -> Result<DecoderConfig, ConfigError> {
        let hex_marker = match self.hex_marker.as_bytes() {
            [] => None,
            [b] if b.is_ascii_graphic() && !is_label_byte(*b) => Some(*b),
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "hex_marker must be empty or one printable non-label character, got {:?}",
                    self.hex_marker
                )));
            }
        };
        Ok(DecoderConfig { hex_marker })
    }
}

/// Port discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Ports to probe. Empty means every port the system reports.
    pub candidates: Vec<String>,
    /// Frames tried per candidate.
    pub attempts: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl DiscoveryConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(list) = std::env::var("VEDIRECT_DISCOVERY_CANDIDATES") {
            self.candidates = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(attempts) = std::env::var("VEDIRECT_DISCOVERY_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.attempts = n;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 {
            return Err(ConfigError::ValidationError(
                "discovery attempts must be greater than 0".to_string(),
            ));
        }
        if let Some(bad) = self.candidates.iter().find(|p| !is_valid_port_name(p)) {
            return Err(ConfigError::ValidationError(format!(
                "invalid discovery candidate '{bad}'"
            )));
        }
        Ok(())
    }

    /// Returns the configured candidates, or the system's serial ports when
    /// none are configured.
    pub fn resolve_candidates(&self) -> Result<Vec<String>, VedirectError> {
        if self.candidates.is_empty() {
            Ok(list_ports()?)
        } else {
            Ok(self.candidates.clone())
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for VedirectError {
    fn from(e: ConfigError) -> Self {
        VedirectError::setting(e.to_string())
    }
}

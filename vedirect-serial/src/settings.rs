//! Serial link settings.

use crate::error::SerialError;
use crate::port::is_valid_port_name;
use crate::{DEFAULT_BAUD, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Baud rates accepted by [`SerialSettings::validate`].
pub const STANDARD_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// Settings for opening a serial port. The link is always 8N1 without
/// flow control, as VE.Direct requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Line speed.
    pub baud: u32,
    /// Per-read timeout in milliseconds. A read that sees no byte within
    /// this window reports "no data" rather than blocking forever.
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: DEFAULT_BAUD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SerialSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Same settings for another port.
    pub fn for_port(&self, port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..self.clone()
        }
    }

    /// Returns the per-read timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the port name, baud rate and timeout.
    pub fn validate(&self) -> Result<(), SerialError> {
        if !is_valid_port_name(&self.port) {
            return Err(SerialError::InvalidPortName(self.port.clone()));
        }
        if !STANDARD_BAUD_RATES.contains(&self.baud) {
            return Err(SerialError::InvalidSettings(format!(
                "unsupported baud rate {}",
                self.baud
            )));
        }
        if self.timeout_ms == 0 {
            return Err(SerialError::InvalidSettings(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

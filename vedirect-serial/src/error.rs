//! Serial transport errors.

use thiserror::Error;

/// Errors from validating, opening, or reading a serial port.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("invalid serial port name: '{0}'")]
    InvalidPortName(String),

    #[error("invalid serial settings: {0}")]
    InvalidSettings(String),

    #[error("serial port not found: {0}")]
    NotFound(String),

    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("serial stream closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Returns whether the error comes from malformed settings rather than
    /// from the device or the link.
    pub fn is_setting_error(&self) -> bool {
        matches!(
            self,
            SerialError::InvalidPortName(_) | SerialError::InvalidSettings(_)
        )
    }
}

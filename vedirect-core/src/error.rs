//! Core error types.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use vedirect_protocol::ProtocolError;
use vedirect_serial::SerialError;

/// Errors from reading, testing, or configuring a VE.Direct link.
#[derive(Debug, Error)]
pub enum VedirectError {
    #[error("invalid setting: {reason}")]
    SettingInvalid { reason: String },

    #[error("input read error: {0}")]
    InputRead(#[from] ProtocolError),

    #[error("read timed out after {elapsed:?} (limit {timeout:?})")]
    Timeout { elapsed: Duration, timeout: Duration },

    #[error("no serial connection attached")]
    NotConnected,

    #[error("serial error: {0}")]
    Serial(#[from] SerialError),
}

/// Broad failure category, telling a caller what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuration or transport settings are malformed. Fix them.
    SettingInvalid,
    /// The byte stream misbehaved; the frame was dropped. Read again.
    InputRead,
    /// Nothing arrived within the time budget.
    Timeout,
    /// No live connection, or the connection failed.
    Vedirect,
}

impl ErrorKind {
    /// Stable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::SettingInvalid => "SETTING_INVALID",
            ErrorKind::InputRead => "INPUT_READ",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Vedirect => "VEDIRECT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl VedirectError {
    pub(crate) fn setting(reason: impl Into<String>) -> Self {
        VedirectError::SettingInvalid {
            reason: reason.into(),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VedirectError::SettingInvalid { .. } => ErrorKind::SettingInvalid,
            VedirectError::InputRead(_) => ErrorKind::InputRead,
            VedirectError::Timeout { .. } => ErrorKind::Timeout,
            VedirectError::NotConnected => ErrorKind::Vedirect,
            VedirectError::Serial(e) if e.is_setting_error() => ErrorKind::SettingInvalid,
            VedirectError::Serial(_) => ErrorKind::Vedirect,
        }
    }

    /// Returns an error code suitable for logs and CLI output.
    pub fn error_code(&self) -> &'static str {
        self.kind().code()
    }

    /// Returns whether calling again may succeed without caller changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::InputRead | ErrorKind::Timeout)
    }
}

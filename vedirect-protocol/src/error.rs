//! Protocol error types.

use thiserror::Error;

/// Errors raised while taking bytes in or decoding a frame.
///
/// Every variant describes malformed or out-of-protocol input. The decoder
/// resets itself before returning any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid byte input: {reason}")]
    InvalidInput { reason: String },

    #[error("checksum mismatch: frame sums to {sum:#04x}, expected 0x00")]
    ChecksumMismatch { sum: u8 },

    #[error("stray byte {0:#04x} after completed frame")]
    StrayByte(u8),

    #[error("invalid label byte {0:#04x}")]
    InvalidLabelByte(u8),

    #[error("empty field label")]
    EmptyLabel,

    #[error("label too long (max {max} bytes)")]
    LabelTooLong { max: usize },

    #[error("value of '{label}' too long (max {max} bytes)")]
    ValueTooLong { label: String, max: usize },

    #[error("invalid UTF-8 in value of '{label}'")]
    InvalidUtf8 { label: String },
}

impl ProtocolError {
    /// Returns whether the error was raised by the checksum check.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, ProtocolError::ChecksumMismatch { .. })
    }
}

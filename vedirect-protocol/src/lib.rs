//! # vedirect-protocol
//!
//! VE.Direct text protocol implementation.
//!
//! This crate provides:
//! - Modulo-256 checksum accumulation over frame bytes
//! - Byte intake normalization for the decoder
//! - A byte-driven frame decoder emitting checksum-verified records
//! - A frame encoder for producing valid frames from records

pub mod checksum;
pub mod codec;
pub mod error;
pub mod frame;
pub mod input;
pub mod record;

pub use checksum::{checksum_byte, Checksum};
pub use codec::Encoder;
pub use error::ProtocolError;
pub use frame::{Decoded, DecoderConfig, DecoderState, FrameDecoder};
pub use input::ByteInput;
pub use record::Record;

/// Label of the field that terminates a frame.
pub const CHECKSUM_LABEL: &str = "Checksum";

/// First byte of a field header.
pub const HEADER_CR: u8 = b'\r';

/// Second byte of a field header.
pub const HEADER_LF: u8 = b'\n';

/// Separator between a label and its value.
pub const DELIMITER: u8 = b'\t';

/// Default marker byte opening a hex sub-frame.
pub const DEFAULT_HEX_MARKER: u8 = b':';

/// Maximum label length in bytes.
pub const MAX_LABEL_LEN: usize = 32;

/// Maximum value length in bytes.
pub const MAX_VALUE_LEN: usize = 64;

/// Returns true if `b` may appear in a field label.
///
/// VE.Direct labels are alphanumeric with `_`, plus `#` as used by `SER#`.
pub fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'#'
}

/// Returns true if `label` is a non-empty string of label bytes.
pub fn is_label(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(is_label_byte)
}

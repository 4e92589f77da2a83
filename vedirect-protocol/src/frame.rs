//! Byte-driven VE.Direct frame decoder.
//!
//! A frame is a run of fields followed by a checksum field:
//!
//! ```text
//! \r\n <label> \t <value>      (repeated)
//! \r\n Checksum \t <byte>
//! ```
//!
//! The checksum byte makes the sum of every byte of the frame, delimiters
//! included, equal to 0 mod 256. Fields are collected into a [`Record`]
//! that is only handed out once that check passes.
//!
//! Lines opening with the hex marker (`:` by default) are asynchronous hex
//! sub-frames. Their bytes count toward the running checksum but are never
//! parsed into fields; a sub-frame ends at the next `\r`.

use crate::checksum::Checksum;
use crate::error::ProtocolError;
use crate::input::ByteInput;
use crate::record::Record;
use crate::{
    is_label_byte, CHECKSUM_LABEL, DEFAULT_HEX_MARKER, DELIMITER, HEADER_CR, HEADER_LF,
    MAX_LABEL_LEN, MAX_VALUE_LEN,
};
use tracing::{debug, trace, warn};

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Byte opening a hex sub-frame at the start of a line. `None` disables
    /// hex sub-frame detection.
    pub hex_marker: Option<u8>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            hex_marker: Some(DEFAULT_HEX_MARKER),
        }
    }
}

/// Parse phase of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Scanning for `\r`; other bytes are discarded.
    AwaitHeader,
    /// Saw `\r`, expecting `\n`.
    AwaitLineFeed,
    /// Accumulating a label until `\t`.
    ReadLabel,
    /// Accumulating a value until `\r`.
    ReadValue,
    /// Expecting the single checksum byte.
    ReadChecksum,
    /// Inside a hex sub-frame, waiting for `\r`.
    HexFrame,
    /// A frame was just emitted; only a new header or hex line may follow.
    FrameComplete,
    /// Saw `\r` right after a frame; only `\n` may follow.
    FrameLineFeed,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The frame is incomplete.
    Pending,
    /// A field was committed to the in-progress record.
    Field,
    /// A checksum-verified record.
    Frame(Record),
}

impl Decoded {
    pub fn is_pending(&self) -> bool {
        matches!(self, Decoded::Pending)
    }

    /// Returns the record if a frame was completed.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Decoded::Frame(record) => Some(record),
            _ => None,
        }
    }
}

/// Decodes one VE.Direct byte stream into records.
///
/// One decoder belongs to one transport. It is not meant to be shared
/// between threads.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    config: DecoderConfig,
    state: DecoderState,
    label: Vec<u8>,
    value: Vec<u8>,
    record: Record,
    checksum: Checksum,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: DecoderState::AwaitHeader,
            label: Vec::with_capacity(MAX_LABEL_LEN),
            value: Vec::with_capacity(MAX_VALUE_LEN),
            record: Record::new(),
            checksum: Checksum::new(),
        }
    }

    /// Current parse phase.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of fields committed to the frame in progress.
    pub fn pending_fields(&self) -> usize {
        self.record.len()
    }

    /// Running checksum of the frame in progress.
    pub fn checksum(&self) -> u8 {
        self.checksum.value()
    }

    /// Discards all parse state and the frame in progress.
    pub fn reset(&mut self) {
        self.state = DecoderState::AwaitHeader;
        self.label.clear();
        self.value.clear();
        self.record.clear();
        self.checksum.reset();
    }

    /// Feeds one logical byte in any accepted input shape.
    pub fn consume<'a>(
        &mut self,
        input: impl Into<ByteInput<'a>>,
    ) -> Result<Decoded, ProtocolError> {
        match input.into().normalize() {
            Ok(b) => self.consume_byte(b),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Feeds one byte.
    ///
    /// On error the decoder has already been reset and the frame in
    /// progress is lost.
    pub fn consume_byte(&mut self, b: u8) -> Result<Decoded, ProtocolError> {
        let result = self.step(b);
        if result.is_err() {
            self.reset();
        }
        result
    }

    /// Feeds a buffer, collecting every completed record.
    ///
    /// Stops at the first error.
    pub fn decode_all(&mut self, bytes: &[u8]) -> Result<Vec<Record>, ProtocolError> {
        let mut records = Vec::new();
        for &b in bytes {
            if let Decoded::Frame(record) = self.consume_byte(b)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn is_hex_marker(&self, b: u8) -> bool {
        self.config.hex_marker == Some(b)
    }

    fn step(&mut self, b: u8) -> Result<Decoded, ProtocolError> {
        self.checksum.add(b);

        match self.state {
            DecoderState::AwaitHeader => {
                if b == HEADER_CR {
                    self.state = DecoderState::AwaitLineFeed;
                } else if self.is_hex_marker(b) {
                    self.state = DecoderState::HexFrame;
                }
                Ok(Decoded::Pending)
            }
            DecoderState::FrameComplete => {
                if b == HEADER_CR {
                    self.state = DecoderState::FrameLineFeed;
                    Ok(Decoded::Pending)
                } else if self.is_hex_marker(b) {
                    self.state = DecoderState::HexFrame;
                    Ok(Decoded::Pending)
                } else {
                    warn!(byte = b, "stray byte after completed frame");
                    Err(ProtocolError::StrayByte(b))
                }
            }
            DecoderState::FrameLineFeed => {
                if b == HEADER_LF {
                    self.label.clear();
                    self.state = DecoderState::ReadLabel;
                    Ok(Decoded::Pending)
                } else {
                    warn!(byte = b, "missing line feed after completed frame");
                    Err(ProtocolError::StrayByte(b))
                }
            }
            DecoderState::AwaitLineFeed => {
                match b {
                    HEADER_LF => {
                        self.label.clear();
                        self.state = DecoderState::ReadLabel;
                    }
                    HEADER_CR => {}
                    _ => self.state = DecoderState::AwaitHeader,
                }
                Ok(Decoded::Pending)
            }
            DecoderState::ReadLabel => self.read_label(b),
            DecoderState::ReadValue => self.read_value(b),
            DecoderState::ReadChecksum => self.finish_frame(),
            DecoderState::HexFrame => {
                if b == HEADER_CR {
                    self.state = DecoderState::AwaitLineFeed;
                }
                Ok(Decoded::Pending)
            }
        }
    }

    fn read_label(&mut self, b: u8) -> Result<Decoded, ProtocolError> {
        if b == DELIMITER {
            if self.label.is_empty() {
                return Err(ProtocolError::EmptyLabel);
            }
            if self.label == CHECKSUM_LABEL.as_bytes() {
                self.state = DecoderState::ReadChecksum;
            } else {
                self.value.clear();
                self.state = DecoderState::ReadValue;
            }
        } else if b == HEADER_CR {
            // Blank line or truncated label: resynchronize on this header.
            self.label.clear();
            self.state = DecoderState::AwaitLineFeed;
        } else if self.label.is_empty() && self.is_hex_marker(b) {
            self.state = DecoderState::HexFrame;
        } else if is_label_byte(b) {
            if self.label.len() >= MAX_LABEL_LEN {
                return Err(ProtocolError::LabelTooLong { max: MAX_LABEL_LEN });
            }
            self.label.push(b);
        } else {
            return Err(ProtocolError::InvalidLabelByte(b));
        }
        Ok(Decoded::Pending)
    }

    fn read_value(&mut self, b: u8) -> Result<Decoded, ProtocolError> {
        if b != HEADER_CR {
            if self.value.len() >= MAX_VALUE_LEN {
                return Err(ProtocolError::ValueTooLong {
                    label: self.label_string(),
                    max: MAX_VALUE_LEN,
                });
            }
            self.value.push(b);
            return Ok(Decoded::Pending);
        }

        let label = self.label_string();
        let value = String::from_utf8(std::mem::take(&mut self.value))
            .map_err(|_| ProtocolError::InvalidUtf8 {
                label: label.clone(),
            })?;
        trace!(%label, %value, "field committed");
        self.record.insert(label, value);
        self.label.clear();

        // The terminating `\r` also opens the next header.
        self.state = DecoderState::AwaitLineFeed;
        Ok(Decoded::Field)
    }

    fn finish_frame(&mut self) -> Result<Decoded, ProtocolError> {
        if !self.checksum.is_valid() {
            let sum = self.checksum.value();
            warn!(sum, fields = self.record.len(), "frame checksum mismatch");
            return Err(ProtocolError::ChecksumMismatch { sum });
        }

        let record = std::mem::take(&mut self.record);
        self.label.clear();
        self.value.clear();
        self.checksum.reset();
        self.state = DecoderState::FrameComplete;
        debug!(fields = record.len(), "frame decoded");
        Ok(Decoded::Frame(record))
    }

    fn label_string(&self) -> String {
        // Label bytes are restricted to ASCII by `is_label_byte`.
        String::from_utf8_lossy(&self.label).into_owned()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

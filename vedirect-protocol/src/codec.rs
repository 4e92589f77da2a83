//! Frame encoder.
//!
//! Produces byte-exact VE.Direct frames from records, mainly for device
//! simulation and tests.

use crate::checksum::checksum_byte;
use crate::error::ProtocolError;
use crate::record::Record;
use crate::{
    is_label_byte, CHECKSUM_LABEL, DELIMITER, HEADER_CR, HEADER_LF, MAX_LABEL_LEN, MAX_VALUE_LEN,
};
use bytes::{BufMut, BytesMut};

/// Encodes records into checksummed frames.
pub struct Encoder;

impl Encoder {
    /// Encodes a record as one frame, fields in label order.
    pub fn encode_record(record: &Record) -> Result<BytesMut, ProtocolError> {
        Self::encode_fields(record.iter())
    }

    /// Encodes fields in the given order as one frame.
    pub fn encode_fields<'a, I>(fields: I) -> Result<BytesMut, ProtocolError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut buf = BytesMut::with_capacity(256);

        for (label, value) in fields {
            validate_field(label, value)?;
            buf.put_u8(HEADER_CR);
            buf.put_u8(HEADER_LF);
            buf.put_slice(label.as_bytes());
            buf.put_u8(DELIMITER);
            buf.put_slice(value.as_bytes());
        }

        buf.put_u8(HEADER_CR);
        buf.put_u8(HEADER_LF);
        buf.put_slice(CHECKSUM_LABEL.as_bytes());
        buf.put_u8(DELIMITER);
        let byte = checksum_byte(&buf);
        buf.put_u8(byte);

        Ok(buf)
    }
}

fn validate_field(label: &str, value: &str) -> Result<(), ProtocolError> {
    if label.is_empty() {
        return Err(ProtocolError::EmptyLabel);
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(ProtocolError::LabelTooLong { max: MAX_LABEL_LEN });
    }
    if let Some(b) = label.bytes().find(|&b| !is_label_byte(b)) {
        return Err(ProtocolError::InvalidLabelByte(b));
    }
    if label == CHECKSUM_LABEL {
        return Err(ProtocolError::InvalidInput {
            reason: format!("'{}' is a reserved label", CHECKSUM_LABEL),
        });
    }
    if value.len() > MAX_VALUE_LEN {
        return Err(ProtocolError::ValueTooLong {
            label: label.to_string(),
            max: MAX_VALUE_LEN,
        });
    }
    if value.bytes().any(|b| b == HEADER_CR) {
        return Err(ProtocolError::InvalidInput {
            reason: format!("value of '{}' contains a carriage return", label),
        });
    }
    Ok(())
}

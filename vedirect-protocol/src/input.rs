//! Byte intake normalization.
//!
//! The decoder takes exactly one logical byte per call. Callers may hold
//! that byte as a raw value, a one-character string, or a one-element byte
//! slice; [`ByteInput`] maps each of these onto one `u8` and rejects any
//! other shape.

use crate::error::ProtocolError;
use bytes::Bytes;

/// One logical input byte in any of the accepted external shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteInput<'a> {
    /// A raw byte value.
    Byte(u8),
    /// A single character, which must be ASCII.
    Char(char),
    /// A text unit, which must hold exactly one ASCII character.
    Text(&'a str),
    /// A byte sequence, which must hold exactly one byte.
    Bytes(&'a [u8]),
}

impl ByteInput<'_> {
    /// Resolves the input to a single byte.
    pub fn normalize(self) -> Result<u8, ProtocolError> {
        match self {
            ByteInput::Byte(b) => Ok(b),
            ByteInput::Char(c) => ascii_char(c),
            ByteInput::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => ascii_char(c),
                    (None, _) => Err(invalid("empty text input")),
                    (Some(_), Some(_)) => Err(invalid(format!(
                        "expected one character, got {} ({:?})",
                        s.chars().count(),
                        s
                    ))),
                }
            }
            ByteInput::Bytes(bytes) => match bytes {
                [b] => Ok(*b),
                [] => Err(invalid("empty byte sequence")),
                _ => Err(invalid(format!(
                    "expected one byte, got {}",
                    bytes.len()
                ))),
            },
        }
    }
}

fn ascii_char(c: char) -> Result<u8, ProtocolError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(invalid(format!("non-ASCII character {:?}", c)))
    }
}

fn invalid(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidInput {
        reason: reason.into(),
    }
}

impl From<u8> for ByteInput<'_> {
    fn from(b: u8) -> Self {
        ByteInput::Byte(b)
    }
}

impl From<char> for ByteInput<'_> {
    fn from(c: char) -> Self {
        ByteInput::Char(c)
    }
}

impl<'a> From<&'a str> for ByteInput<'a> {
    fn from(s: &'a str) -> Self {
        ByteInput::Text(s)
    }
}

impl<'a> From<&'a String> for ByteInput<'a> {
    fn from(s: &'a String) -> Self {
        ByteInput::Text(s.as_str())
    }
}

impl<'a> From<&'a [u8]> for ByteInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ByteInput::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        ByteInput::Bytes(&bytes[..])
    }
}

impl<'a> From<&'a Vec<u8>> for ByteInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ByteInput::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a Bytes> for ByteInput<'a> {
    fn from(bytes: &'a Bytes) -> Self {
        ByteInput::Bytes(bytes.as_ref())
    }
}

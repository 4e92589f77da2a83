//! Modulo-256 frame checksum.
//!
//! A VE.Direct frame carries one checksum byte chosen so that the sum of
//! every byte in the frame, delimiters included, is 0 mod 256.

/// Running byte sum over the bytes of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    /// Adds one byte to the running sum.
    pub fn add(&mut self, b: u8) {
        self.0 = self.0.wrapping_add(b);
    }

    /// Adds every byte of `bytes` to the running sum.
    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.add(b);
        }
    }

    /// Current sum mod 256.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// True when the bytes seen so far form a complete, intact frame.
    pub fn is_valid(&self) -> bool {
        self.0 == 0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Returns the byte that brings the sum of `bytes` to 0 mod 256.
pub fn checksum_byte(bytes: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.extend(bytes);
    0u8.wrapping_sub(sum.value())
}

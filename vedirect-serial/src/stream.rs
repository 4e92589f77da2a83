//! Byte streams.

use crate::error::SerialError;
use crate::port::ensure_reachable;
use crate::settings::SerialSettings;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, ErrorKind, Read};
use tracing::info;

/// A source of bytes read one at a time.
///
/// `Ok(None)` means no byte arrived within the read timeout. A stream that
/// reached its end reports [`SerialError::Closed`].
pub trait ByteStream {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError>;
}

impl<R: Read + ?Sized> ByteStream for R {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let mut buf = [0u8; 1];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Err(SerialError::Closed),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// An open serial port.
pub struct SerialStream {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialStream {
    /// Validates `settings` and opens the port 8N1.
    pub fn open(settings: &SerialSettings) -> Result<Self, SerialError> {
        settings.validate()?;
        ensure_reachable(&settings.port)?;

        let port = serialport::new(&settings.port, settings.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout())
            .open()
            .map_err(|source| SerialError::Open {
                port: settings.port.clone(),
                source,
            })?;

        info!(port = %settings.port, baud = settings.baud, "serial port opened");
        Ok(Self {
            port,
            name: settings.port.clone(),
        })
    }

    /// Drops bytes received but not yet read.
    pub fn clear_input(&mut self) -> Result<(), SerialError> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| SerialError::Io(e.into()))
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("name", &self.name)
            .finish()
    }
}

//! Serial port discovery.
//!
//! Walks a list of candidate ports, reads one record from each and returns
//! the first port whose record passes the configured serial tests.

use crate::error::{ErrorKind, VedirectError};
use crate::reader::Vedirect;
use crate::serial_test::SerialTestEvaluator;
use std::time::Duration;
use tracing::{debug, info, warn};
use vedirect_protocol::DecoderConfig;
use vedirect_serial::{ByteStream, SerialError, SerialSettings, SerialStream};

/// Default number of frames tried per candidate.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Opens a byte stream for a port name.
pub trait PortOpener {
    type Stream: ByteStream;

    fn open(&self, port: &str) -> Result<Self::Stream, SerialError>;
}

/// Opens real serial ports, copying everything but the port name from a
/// settings template.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    template: SerialSettings,
}

impl SerialOpener {
    pub fn new(template: SerialSettings) -> Self {
        Self { template }
    }
}

impl PortOpener for SerialOpener {
    type Stream = SerialStream;

    fn open(&self, port: &str) -> Result<SerialStream, SerialError> {
        SerialStream::open(&self.template.for_port(port))
    }
}

/// Finds the port a device is attached to.
pub struct PortDiscovery<'a, O> {
    opener: O,
    evaluator: &'a SerialTestEvaluator,
    decoder_config: DecoderConfig,
    timeout: Duration,
    attempts: u32,
}

impl<'a, O: PortOpener> PortDiscovery<'a, O> {
    pub fn new(opener: O, evaluator: &'a SerialTestEvaluator) -> Self {
        Self {
            opener,
            evaluator,
            decoder_config: DecoderConfig::default(),
            timeout: Duration::from_secs(10),
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder_config = config;
        self
    }

    /// Time budget for reading one record from a candidate.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Frames tried per candidate before moving on. At least one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Opens `port` and checks one record against the serial tests.
    ///
    /// A malformed frame costs one attempt. A timeout ends the probe.
    pub fn probe(&self, port: &str) -> Result<bool, VedirectError> {
        let stream = self.opener.open(port)?;
        let mut reader = Vedirect::with_config(stream, self.decoder_config);

        for attempt in 1..=self.attempts {
            match reader.read_single(self.timeout) {
                Ok(record) => return Ok(self.evaluator.evaluate(&record)),
                Err(e) if e.kind() == ErrorKind::InputRead => {
                    debug!(port, attempt, error = %e, "malformed frame while probing");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    /// Returns the first candidate whose record passes the serial tests.
    ///
    /// Fails when no tests are configured. Candidates that cannot be opened
    /// or read are skipped.
    pub fn find_port<I, P>(&self, candidates: I) -> Result<Option<String>, VedirectError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        if !self.evaluator.has_tests() {
            return Err(VedirectError::setting(
                "no serial tests configured, cannot identify a port",
            ));
        }

        for candidate in candidates {
            let port = candidate.as_ref();
            match self.probe(port) {
                Ok(true) => {
                    info!(port, "serial tests passed");
                    return Ok(Some(port.to_string()));
                }
                Ok(false) => info!(port, "serial tests failed"),
                Err(e) => warn!(port, code = e.error_code(), error = %e, "skipping port"),
            }
        }
        Ok(None)
    }
}

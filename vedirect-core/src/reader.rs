//! Timeout-guarded read loop.
//!
//! [`Vedirect`] pairs a [`FrameDecoder`] with at most one byte stream and
//! pulls bytes until records come out. The loop is cooperative: the elapsed
//! time is checked before each byte pull, so one blocking read can overrun
//! the budget by up to the stream's own read timeout.

use crate::error::VedirectError;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use vedirect_protocol::{Decoded, DecoderConfig, FrameDecoder, Record};
use vedirect_serial::{ByteStream, SerialError, SerialSettings, SerialStream};

/// Default time budget of one read loop invocation.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Bounds of one read loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Wall-clock budget measured from the start of the loop.
    pub timeout: Duration,
    /// Total number of records to deliver before returning. `None` keeps
    /// polling until the timeout fires.
    pub max_loops: Option<u32>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READ_TIMEOUT,
            max_loops: Some(1),
        }
    }
}

impl ReadOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_max_loops(mut self, max_loops: u32) -> Self {
        self.max_loops = Some(max_loops);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_loops = None;
        self
    }
}

/// Fails with a timeout once `elapsed` reaches `timeout`.
///
/// `elapsed == timeout` is already a timeout.
pub fn check_timeout(elapsed: Duration, timeout: Duration) -> Result<(), VedirectError> {
    if elapsed < timeout {
        Ok(())
    } else {
        Err(VedirectError::Timeout { elapsed, timeout })
    }
}

/// Pulls bytes from `stream` into `decoder` until a record is emitted.
///
/// Returns `Ok(None)` when no byte arrives in time or the stream is closed.
/// Decoder errors propagate unchanged; the decoder has already reset itself
/// by then.
pub fn read_once<S>(
    decoder: &mut FrameDecoder,
    stream: &mut S,
) -> Result<Option<Record>, VedirectError>
where
    S: ByteStream + ?Sized,
{
    loop {
        let b = match stream.read_byte() {
            Ok(Some(b)) => b,
            Ok(None) | Err(SerialError::Closed) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if let Decoded::Frame(record) = decoder.consume_byte(b)? {
            return Ok(Some(record));
        }
    }
}

/// A VE.Direct reader: one decoder and the stream it reads from.
pub struct Vedirect<S = SerialStream> {
    decoder: FrameDecoder,
    stream: Option<S>,
}

impl<S: ByteStream> Vedirect<S> {
    /// Creates a reader over `stream` with the default decoder settings.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, DecoderConfig::default())
    }

    pub fn with_config(stream: S, config: DecoderConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
            stream: Some(stream),
        }
    }

    /// Creates a reader with no stream attached. Reads fail until
    /// [`attach`](Self::attach) is called.
    pub fn detached(config: DecoderConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
            stream: None,
        }
    }

    /// Attaches `stream`, returning the previous one. The decoder is reset.
    pub fn attach(&mut self, stream: S) -> Option<S> {
        self.decoder.reset();
        self.stream.replace(stream)
    }

    /// Detaches and returns the current stream.
    pub fn detach(&mut self) -> Option<S> {
        self.decoder.reset();
        self.stream.take()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Drops any partially decoded frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Reads until one record is emitted or the stream runs dry.
    pub fn read_once(&mut self) -> Result<Option<Record>, VedirectError> {
        let stream = self.stream.as_mut().ok_or(VedirectError::NotConnected)?;
        read_once(&mut self.decoder, stream)
    }

    /// Delivers decoded records to `callback` until `options.max_loops`
    /// records were delivered, returning how many were.
    ///
    /// Fails with [`VedirectError::Timeout`] when the budget runs out first,
    /// with the decoder's error on the first malformed frame, and with
    /// [`SerialError::Closed`] as soon as the stream reaches its end.
    pub fn read_with_callback<F>(
        &mut self,
        mut callback: F,
        options: &ReadOptions,
    ) -> Result<u32, VedirectError>
    where
        F: FnMut(Record),
    {
        let stream = self.stream.as_mut().ok_or(VedirectError::NotConnected)?;
        let start = Instant::now();
        let mut delivered = 0u32;

        loop {
            if options.max_loops.is_some_and(|max| delivered >= max) {
                return Ok(delivered);
            }
            check_timeout(start.elapsed(), options.timeout)?;

            let Some(b) = stream.read_byte()? else {
                trace!("no byte available");
                continue;
            };
            if let Decoded::Frame(record) = self.decoder.consume_byte(b)? {
                delivered += 1;
                debug!(fields = record.len(), delivered, "record delivered");
                callback(record);
            }
        }
    }

    /// Reads exactly one record within `timeout`.
    pub fn read_single(&mut self, timeout: Duration) -> Result<Record, VedirectError> {
        let mut out = None;
        let options = ReadOptions::new(timeout).with_max_loops(1);
        self.read_with_callback(|record| out = Some(record), &options)?;
        out.ok_or(VedirectError::Timeout {
            elapsed: timeout,
            timeout,
        })
    }
}

impl Vedirect<SerialStream> {
    /// Opens the serial port described by `settings`, dropping any bytes
    /// buffered before the first read.
    pub fn connect(
        settings: &SerialSettings,
        config: DecoderConfig,
    ) -> Result<Self, VedirectError> {
        let mut stream = SerialStream::open(settings)?;
        stream.clear_input()?;
        Ok(Self::with_config(stream, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::{self, Cursor, Read};
    use vedirect_protocol::{checksum_byte, DecoderState, Encoder, ProtocolError};

    /// Serves its bytes, then behaves like a port with nothing to say.
    struct IdlePort(Cursor<Vec<u8>>);

    impl IdlePort {
        fn new(bytes: Vec<u8>) -> Self {
            Self(Cursor::new(bytes))
        }
    }

    impl Read for IdlePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => {
                    std::thread::sleep(Duration::from_millis(1));
                    Err(io::ErrorKind::TimedOut.into())
                }
                n => Ok(n),
            }
        }
    }

    /// Reports end of stream on every read.
    struct ClosedPort {
        reads: usize,
    }

    impl Read for ClosedPort {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            Ok(0)
        }
    }

    fn frame(fields: &[(&str, &str)]) -> Vec<u8> {
        Encoder::encode_fields(fields.iter().copied()).unwrap().to_vec()
    }

    fn short_options() -> ReadOptions {
        ReadOptions::new(Duration::from_millis(100))
    }

    #[test]
    fn test_check_timeout_boundary() {
        let timeout = Duration::from_secs(60);
        assert!(check_timeout(Duration::from_secs(59), timeout).is_ok());

        let err = check_timeout(Duration::from_secs(60), timeout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = check_timeout(Duration::from_secs(61), timeout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_check_timeout_zero_budget() {
        assert!(check_timeout(Duration::ZERO, Duration::ZERO).is_err());
    }

    #[test]
    fn test_read_once_free_function() {
        let mut decoder = FrameDecoder::new();
        let mut stream = Cursor::new(frame(&[("PID", "Ox03")]));

        let record = read_once(&mut decoder, &mut stream).unwrap().unwrap();
        assert_eq!(record.get("PID"), Some("Ox03"));
        assert_eq!(record.len(), 1);

        // Stream is exhausted.
        assert!(read_once(&mut decoder, &mut stream).unwrap().is_none());
    }

    #[test]
    fn test_read_once_propagates_checksum_error() {
        let mut bytes = frame(&[("PID", "0x204")]);
        let last = bytes.len() - 1;
        bytes[last] = bytes[last].wrapping_add(1);

        let mut reader = Vedirect::new(Cursor::new(bytes));
        let err = reader.read_once().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputRead);
        assert!(matches!(
            err,
            VedirectError::InputRead(ProtocolError::ChecksumMismatch { .. })
        ));
        assert_eq!(reader.decoder().state(), DecoderState::AwaitHeader);
    }

    #[test]
    fn test_read_without_stream() {
        let mut reader: Vedirect<Cursor<Vec<u8>>> = Vedirect::detached(DecoderConfig::default());
        assert!(!reader.has_stream());

        let err = reader.read_once().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Vedirect);

        let err = reader
            .read_with_callback(|_| {}, &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, VedirectError::NotConnected));
    }

    #[test]
    fn test_read_with_callback_delivers_records() {
        let mut bytes = frame(&[("PID", "0x204"), ("V", "12800")]);
        bytes.extend(frame(&[("PID", "0x204"), ("V", "12810")]));
        let mut reader = Vedirect::new(Cursor::new(bytes));

        let mut seen = Vec::new();
        let options = short_options().with_max_loops(2);
        let delivered = reader
            .read_with_callback(|record| seen.push(record), &options)
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(seen[0].get("V"), Some("12800"));
        assert_eq!(seen[1].get("V"), Some("12810"));
    }

    #[test]
    fn test_read_with_callback_zero_loops() {
        let mut reader = Vedirect::new(Cursor::new(frame(&[("V", "1")])));
        let options = short_options().with_max_loops(0);

        let delivered = reader.read_with_callback(|_| {}, &options).unwrap();
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_read_with_callback_times_out_on_silence() {
        let mut reader = Vedirect::new(IdlePort::new(Vec::new()));
        let err = reader
            .read_with_callback(|_| {}, &short_options())
            .unwrap_err();

        match err {
            VedirectError::Timeout { elapsed, timeout } => {
                assert!(elapsed >= timeout);
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_read_with_callback_unbounded_ends_with_timeout() {
        let mut reader = Vedirect::new(IdlePort::new(frame(&[("V", "1")])));
        let mut count = 0;
        let err = reader
            .read_with_callback(|_| count += 1, &short_options().unbounded())
            .unwrap_err();

        assert_eq!(count, 1);
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_read_with_callback_fails_on_closed_stream() {
        let mut reader = Vedirect::new(ClosedPort { reads: 0 });
        let err = reader
            .read_with_callback(|_| {}, &ReadOptions::new(Duration::from_secs(60)))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Vedirect);
        assert!(matches!(err, VedirectError::Serial(SerialError::Closed)));
        assert_eq!(reader.detach().map(|port| port.reads), Some(1));
    }

    #[test]
    fn test_read_once_returns_on_closed_stream() {
        let mut decoder = FrameDecoder::new();
        let mut port = ClosedPort { reads: 0 };

        assert!(read_once(&mut decoder, &mut port).unwrap().is_none());
        assert_eq!(port.reads, 1);
    }

    #[test]
    fn test_read_with_callback_stray_byte_after_frame() {
        let mut bytes = frame(&[("PID", "Ox03")]);
        bytes.push(b'x');
        let mut reader = Vedirect::new(Cursor::new(bytes));

        let mut count = 0;
        let err = reader
            .read_with_callback(|_| count += 1, &short_options().with_max_loops(2))
            .unwrap_err();

        assert_eq!(count, 1);
        assert!(matches!(
            err,
            VedirectError::InputRead(ProtocolError::StrayByte(b'x'))
        ));
    }

    #[test]
    fn test_read_single() {
        let mut body = b"\r\nPID\t0x203\r\nV\t26201\r\nChecksum\t".to_vec();
        body.push(checksum_byte(&body));
        let mut reader = Vedirect::new(Cursor::new(body));

        let record = reader.read_single(Duration::from_millis(100)).unwrap();
        assert_eq!(record.get("PID"), Some("0x203"));
        assert_eq!(record.get("V"), Some("26201"));
    }

    #[test]
    fn test_attach_and_detach() {
        let mut reader: Vedirect<Cursor<Vec<u8>>> = Vedirect::detached(DecoderConfig::default());
        assert!(reader.attach(Cursor::new(frame(&[("V", "1")]))).is_none());
        assert!(reader.has_stream());

        let record = reader.read_once().unwrap().unwrap();
        assert_eq!(record.get("V"), Some("1"));

        assert!(reader.detach().is_some());
        assert!(!reader.has_stream());
        assert!(reader.detach().is_none());
    }

    #[test]
    fn test_attach_resets_partial_frame() {
        // Half a frame from the first stream must not leak into the next.
        let mut reader = Vedirect::new(Cursor::new(b"\r\nPID\t0x2".to_vec()));
        assert!(reader.read_once().unwrap().is_none());
        assert_eq!(reader.decoder().state(), DecoderState::ReadValue);

        reader.attach(Cursor::new(frame(&[("V", "2")])));
        assert_eq!(reader.decoder().state(), DecoderState::AwaitHeader);

        let record = reader.read_once().unwrap().unwrap();
        assert!(!record.contains_key("PID"));
        assert_eq!(record.get("V"), Some("2"));
    }

    #[test]
    fn test_connect_invalid_port() {
        let settings = SerialSettings::new("/etc/bad_port");
        let err = Vedirect::connect(&settings, DecoderConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::SettingInvalid);
    }

    #[test]
    fn test_connect_missing_device() {
        let port = "/tmp/vmodem255";
        if std::path::Path::new(port).exists() {
            return;
        }
        let err = Vedirect::connect(&SerialSettings::new(port), DecoderConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Vedirect);
    }
}

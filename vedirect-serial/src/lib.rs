//! # vedirect-serial
//!
//! Serial transport for vedirect.
//!
//! This crate provides:
//! - Port name validation and reachability checks
//! - Serial settings with validation
//! - The `ByteStream` byte-at-a-time read contract
//! - Opening real ports through the `serialport` crate

pub mod error;
pub mod port;
pub mod settings;
pub mod stream;

pub use error::SerialError;
pub use port::{is_reachable, is_valid_port_name, list_ports};
pub use settings::SerialSettings;
pub use stream::{ByteStream, SerialStream};

/// VE.Direct line speed.
pub const DEFAULT_BAUD: u32 = 19200;

/// Default per-read timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

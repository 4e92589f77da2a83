//! # vedirect-core
//!
//! VE.Direct reader for vedirect.
//!
//! This crate provides:
//! - The timeout-guarded read loop driving a frame decoder over a byte stream
//! - Serial test rules identifying a device from one decoded record
//! - Port discovery across candidate serial ports
//! - Configuration loading

pub mod config;
pub mod discovery;
pub mod error;
pub mod reader;

pub use config::{Config, ConfigError, DecoderSettings, DiscoveryConfig, ReadConfig};
pub use discovery::{PortDiscovery, PortOpener, SerialOpener};
pub use error::{ErrorKind, VedirectError};
pub use reader::{check_timeout, read_once, ReadOptions, Vedirect};
pub use serial_test::{RawSuite, SerialTestEvaluator, SerialTestRaw, SerialTestRule, TestSuite};

//! Serial port names.
//!
//! Accepted names:
//! - `/dev/tty*`, `/dev/cu.*`, `/dev/rfcomm*` and `/dev/serial/...` device nodes
//! - `/tmp/vmodem<N>` virtual modems (socat pairs used for testing)
//! - `COM<N>` and `\\.\COM<N>` on Windows

use crate::error::SerialError;
use std::path::Path;
use tracing::debug;

const DEVICE_PREFIXES: &[&str] = &["/dev/tty", "/dev/cu.", "/dev/rfcomm", "/dev/serial/"];
const VIRTUAL_PREFIX: &str = "/tmp/vmodem";
const MAX_PORT_NAME_LEN: usize = 255;

/// Returns true if `name` is a syntactically valid serial port name.
pub fn is_valid_port_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_PORT_NAME_LEN {
        return false;
    }

    if let Some(n) = com_number(name) {
        return !n.is_empty() && n.len() <= 3 && n.bytes().all(|b| b.is_ascii_digit());
    }

    if let Some(n) = name.strip_prefix(VIRTUAL_PREFIX) {
        return !n.is_empty() && n.len() <= 3 && n.bytes().all(|b| b.is_ascii_digit());
    }

    let Some(prefix) = DEVICE_PREFIXES.iter().find(|p| name.starts_with(*p)) else {
        return false;
    };
    let rest = &name[prefix.len()..];
    !rest.is_empty()
        && !name.ends_with('/')
        && !name.contains("..")
        && !name.contains("//")
        && rest
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b':'))
}

fn com_number(name: &str) -> Option<&str> {
    name.strip_prefix(r"\\.\COM")
        .or_else(|| name.strip_prefix("COM"))
}

/// Returns true if `name` is valid and the port appears to exist.
///
/// Windows COM ports are not visible on the filesystem; their existence is
/// only confirmed when opening them.
pub fn is_reachable(name: &str) -> bool {
    if !is_valid_port_name(name) {
        return false;
    }
    com_number(name).is_some() || Path::new(name).exists()
}

/// Validates `name` and checks that the port exists.
pub fn ensure_reachable(name: &str) -> Result<(), SerialError> {
    if !is_valid_port_name(name) {
        return Err(SerialError::InvalidPortName(name.to_string()));
    }
    if !is_reachable(name) {
        return Err(SerialError::NotFound(name.to_string()));
    }
    Ok(())
}

/// Lists the serial ports known to the system, keeping valid names only.
pub fn list_ports() -> Result<Vec<String>, SerialError> {
    let ports = serialport::available_ports().map_err(SerialError::Enumerate)?;

    let names: Vec<String> = ports
        .into_iter()
        .map(|p| p.port_name)
        // On macOS, prefer /dev/cu.* (calling unit) over the blocking /dev/tty.*
        .filter(|name| !(cfg!(target_os = "macos") && name.starts_with("/dev/tty.")))
        .filter(|name| is_valid_port_name(name))
        .collect();

    debug!(count = names.len(), "enumerated serial ports");
    Ok(names)
}

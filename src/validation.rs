//! Connection parameter validation
//!
//! Pure checks, no socket is touched.

use std::net::Ipv4Addr;

use crate::error::{PatliteError, Result};

/// Highest valid TCP port
pub const MAX_PORT: u32 = u16::MAX as u32;

/// Parse a dotted-quad IPv4 literal
///
/// Hostnames, IPv6 addresses and surrounding whitespace are rejected.
pub fn parse_ipv4(address: &str) -> Result<Ipv4Addr> {
    address
        .parse::<Ipv4Addr>()
        .map_err(|_| PatliteError::InvalidAddress(address.to_string()))
}

/// Check that a port fits in 0-65535
pub fn validate_port(port: u32) -> Result<u16> {
    if port > MAX_PORT {
        return Err(PatliteError::InvalidPort(port));
    }
    Ok(port as u16)
}

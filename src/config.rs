//! Configuration for a signal-tower connection
//!
//! Centralized configuration with sensible defaults. Everything here is
//! validated by `ConfigBuilder::build` before any socket is created.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::{PatliteError, Result};
use crate::protocol::DEFAULT_RECV_BUFFER_SIZE;
use crate::validation::{parse_ipv4, validate_port};

/// Factory default TCP port of the PNS listener
pub const DEFAULT_PORT: u16 = 10000;

/// Connection configuration for one device
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target
    // -------------------------------------------------------------------------
    /// Device IPv4 address
    pub address: Ipv4Addr,

    /// Device TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Upper bound for the single read performed per command
    pub recv_buffer_size: usize,

    /// Socket read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::new(192, 168, 10, 1),
            port: DEFAULT_PORT,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate an address/port pair with every other setting at its default
    pub fn new(address: &str, port: u32) -> Result<Self> {
        Self::builder().address(address).port(port).build()
    }

    /// Socket address of the device
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }
}

/// Builder for Config
///
/// Address and port are kept raw until `build` so that validation errors
/// surface in one place.
#[derive(Debug)]
pub struct ConfigBuilder {
    address: String,
    port: u32,
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        let config = Config::default();
        Self {
            address: config.address.to_string(),
            port: u32::from(config.port),
            config,
        }
    }
}

impl ConfigBuilder {
    /// Set the device address (IPv4 literal)
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the device port
    pub fn port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    /// Set the maximum number of bytes read per response
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut config = self.config;
        config.address = parse_ipv4(&self.address)?;
        config.port = validate_port(self.port)?;

        if config.recv_buffer_size == 0 {
            return Err(PatliteError::Config(
                "recv_buffer_size must be at least 1 byte".to_string(),
            ));
        }

        Ok(config)
    }
}

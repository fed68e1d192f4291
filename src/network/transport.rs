//! Transport
//!
//! The codec only needs "write these bytes" and "give me what arrived". Both
//! sides of that boundary are traits so the facade can be driven by a TCP
//! socket or by an in-memory device double.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;

/// An established byte channel to one device
pub trait Transport {
    /// Write the whole frame
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Perform one read of at most `max` bytes
    ///
    /// Returns whatever the underlying read produced; a reply split across
    /// reads is not reassembled.
    fn recv(&mut self, max: usize) -> io::Result<Bytes>;

    /// Release the channel
    fn close(&mut self) -> io::Result<()>;
}

/// Opens transports
pub trait Connector {
    type Transport: Transport;

    fn connect(&mut self, config: &Config) -> io::Result<Self::Transport>;
}

// =============================================================================
// TCP
// =============================================================================

/// Connects over blocking TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    fn connect(&mut self, config: &Config) -> io::Result<TcpTransport> {
        let stream = TcpStream::connect(config.socket_addr())?;
        let transport = TcpTransport::new(stream)?;
        transport.configure(config)?;
        Ok(transport)
    }
}

/// Blocking TCP transport
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self { stream, peer_addr })
    }

    /// Apply socket options from the config
    ///
    /// A timeout of 0 leaves the socket fully blocking.
    pub fn configure(&self, config: &Config) -> io::Result<()> {
        self.stream.set_nodelay(config.nodelay)?;

        if config.read_timeout_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        Ok(())
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame)?;
        self.stream.flush()
    }

    fn recv(&mut self, max: usize) -> io::Result<Bytes> {
        let mut buf = vec![0u8; max];
        let n = self.stream.read(&mut buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed by {}", self.peer_addr),
            ));
        }
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            // Peer already gone
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

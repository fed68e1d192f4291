//! Connection Facade
//!
//! Owns the transport for one device and turns commands into typed
//! responses.
//!
//! ## Lifecycle
//! ```text
//! Unopened ──open()──► Open ──close()/drop──► Closed
//! ```
//! `Closed` is terminal. Commands are only accepted while `Open`.

use crate::config::Config;
use crate::error::{PatliteError, Result};
use crate::protocol::{
    Command, DetailStatusResponse, Payload, ReadResponse, Response, StatusResponse,
    PNS_HEADER_SIZE,
};

use super::hex;
use super::transport::{Connector, TcpConnector, Transport};

/// Observable facade state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unopened,
    Open,
    Closed,
}

enum Link<T> {
    Unopened,
    Open(T),
    Closed,
}

/// Request/response client for one signal tower
///
/// One command is in flight at a time; `&mut self` on every operation
/// enforces that. Use one instance per device.
pub struct PatliteControl<C: Connector = TcpConnector> {
    config: Config,
    connector: C,
    link: Link<C::Transport>,
}

impl PatliteControl<TcpConnector> {
    /// Validate the target without touching the network
    pub fn new(address: &str, port: u32) -> Result<Self> {
        Ok(Self::from_config(Config::new(address, port)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> PatliteControl<C> {
    /// Build a facade around a custom connector
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config,
            connector,
            link: Link::Unopened,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        match self.link {
            Link::Unopened => ConnectionState::Unopened,
            Link::Open(_) => ConnectionState::Open,
            Link::Closed => ConnectionState::Closed,
        }
    }

    /// Establish the transport
    ///
    /// Only valid from `Unopened`. An open facade keeps its transport and a
    /// closed one cannot be reopened; both report `NotConnected`.
    pub fn open(&mut self) -> Result<()> {
        if !matches!(self.link, Link::Unopened) {
            return Err(PatliteError::NotConnected);
        }

        tracing::debug!("Connecting to {}", self.config.socket_addr());
        let transport = self.connector.connect(&self.config)?;
        self.link = Link::Open(transport);
        tracing::debug!("Connected to {}", self.config.socket_addr());

        Ok(())
    }

    /// Release the transport and move to `Closed`
    ///
    /// Idempotent. The facade is `Closed` afterwards even if the transport
    /// reports an error while shutting down.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.link, Link::Closed) {
            Link::Open(mut transport) => {
                tracing::debug!("Closing connection to {}", self.config.socket_addr());
                transport.close()?;
                Ok(())
            }
            Link::Unopened | Link::Closed => Ok(()),
        }
    }

    /// Open, run `f`, and close on every exit path
    ///
    /// The transport is released whether `f` returns, fails, or panics. An
    /// error from `f` takes precedence over an error from closing.
    pub fn session<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.open()?;

        let mut guard = CloseOnExit { control: self };
        let result = f(&mut *guard.control);
        let closed = guard.control.close();

        let value = result?;
        closed?;
        Ok(value)
    }

    /// Send one command and parse its reply
    ///
    /// Exactly one write and one read of at most `recv_buffer_size` bytes.
    /// A negative acknowledgment is returned as a normal response.
    pub fn send_command(&mut self, command: &Command) -> Result<Response> {
        let transport = match &mut self.link {
            Link::Open(transport) => transport,
            Link::Unopened | Link::Closed => return Err(PatliteError::NotConnected),
        };

        let frame = command.encode();
        tracing::trace!("-> {} [{}]", command.id().name(), loggable_frame(command, &frame));
        transport.send(&frame)?;

        let raw = transport.recv(self.config.recv_buffer_size)?;
        tracing::trace!("<- {} [{}]", command.id().name(), hex(&raw));

        let response = command.parse_response(raw)?;
        if response.is_negative_ack() {
            tracing::debug!("{} rejected by device", command.id().name());
        }
        Ok(response)
    }

    // -------------------------------------------------------------------------
    // Typed Queries
    // -------------------------------------------------------------------------

    pub fn get_status(&mut self) -> Result<StatusResponse> {
        self.send_command(&Command::get_status())?.into_status()
    }

    pub fn get_detail_status(&mut self) -> Result<DetailStatusResponse> {
        self.send_command(&Command::get_detail_status())?
            .into_detail_status()
    }

    pub fn read_state(&mut self) -> Result<ReadResponse> {
        self.send_command(&Command::read())?.into_read()
    }
}

impl<C: Connector> Drop for PatliteControl<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Error closing connection to {}: {}", self.config.socket_addr(), e);
        }
    }
}

/// Hex dump of an outgoing frame with any password bytes left out
fn loggable_frame(command: &Command, frame: &[u8]) -> String {
    match command.payload() {
        Payload::Password(_) if frame.len() >= PNS_HEADER_SIZE => format!(
            "{} +{} bytes redacted",
            hex(&frame[..PNS_HEADER_SIZE]),
            frame.len() - PNS_HEADER_SIZE
        ),
        _ => hex(frame),
    }
}

/// Closes the facade when a session unwinds
struct CloseOnExit<'a, C: Connector> {
    control: &'a mut PatliteControl<C>,
}

impl<C: Connector> Drop for CloseOnExit<'_, C> {
    fn drop(&mut self) {
        let _ = self.control.close();
    }
}

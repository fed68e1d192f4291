//! Network Module
//!
//! Device connection handling.
//!
//! ## Architecture
//! - `Connector` opens a `Transport` (blocking TCP by default)
//! - `PatliteControl` owns the transport and runs one command at a time
//! - Framing and parsing are delegated to `Command`

mod connection;
mod transport;

pub use connection::{ConnectionState, PatliteControl};
pub use transport::{Connector, TcpConnector, TcpTransport, Transport};

/// Space-separated hex dump for trace logs
pub(crate) fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

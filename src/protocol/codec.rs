//! Protocol codec
//!
//! Frame encoding for both sub-protocols, plus the inverse used by device
//! simulators and tests.
//!
//! ## Wire Format
//!
//! ### PNS Frame
//! ```text
//! ┌──────────┬────────┬─────────┬──────────┬───────────────────┐
//! │ "AB" (2) │ Id (1) │ Pad (1) │ Len (2)  │  Payload (Len)    │
//! └──────────┴────────┴─────────┴──────────┴───────────────────┘
//! ```
//! `Len` is big-endian.
//!
//! ### PHN Frame
//! ```text
//! ┌────────┬────────────────┐
//! │ Id (1) │ Flags (0 or 1) │
//! └────────┴────────────────┘
//! ```

use bytes::BufMut;

use super::command::{Command, CommandId, SubProtocol};
use super::constants::PRODUCT_CATEGORY;
use super::payload::Payload;
use crate::error::{PatliteError, Result};

/// PNS header size: tag (2) + id (1) + pad (1) + length (2)
pub const PNS_HEADER_SIZE: usize = 6;

/// Value of the PNS pad byte
pub const PNS_PAD: u8 = 0x00;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a PNS frame
///
/// Format: "AB" (2) + id (1) + pad (1) + payload_len (2, BE) + payload
pub fn encode_pns_frame(id: u8, payload: &Payload) -> Vec<u8> {
    let body = payload.encode();

    let mut frame = Vec::with_capacity(PNS_HEADER_SIZE + body.len());
    frame.put_slice(&PRODUCT_CATEGORY);
    frame.put_u8(id);
    frame.put_u8(PNS_PAD);
    frame.put_u16(payload.declared_length());
    frame.put_slice(&body);

    frame
}

/// Encode a PHN frame
///
/// Format: id (1) + payload (0 or 1 byte, no length field)
pub fn encode_phn_frame(id: u8, payload: &Payload) -> Vec<u8> {
    let body = payload.encode();

    let mut frame = Vec::with_capacity(1 + body.len());
    frame.put_u8(id);
    frame.put_slice(&body);

    frame
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a complete frame back into a command
///
/// Frames opening with the product tag are read as PNS, anything else as
/// PHN. The frame must contain exactly one command.
pub fn decode_frame(bytes: &[u8]) -> Result<Command> {
    if bytes.is_empty() {
        return Err(PatliteError::Protocol("Empty frame".to_string()));
    }

    if bytes.starts_with(&PRODUCT_CATEGORY) {
        decode_pns_frame(bytes)
    } else {
        decode_phn_frame(bytes)
    }
}

fn decode_pns_frame(bytes: &[u8]) -> Result<Command> {
    if bytes.len() < PNS_HEADER_SIZE {
        return Err(PatliteError::Protocol(format!(
            "Incomplete PNS header: expected {} bytes, got {}",
            PNS_HEADER_SIZE,
            bytes.len()
        )));
    }

    let id = CommandId::from_byte(SubProtocol::Pns, bytes[2])?;
    let payload_len = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;

    let total_len = PNS_HEADER_SIZE + payload_len;
    if bytes.len() != total_len {
        return Err(PatliteError::Protocol(format!(
            "PNS frame length mismatch: header says {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let payload = Payload::decode(id.spec().payload, &bytes[PNS_HEADER_SIZE..])?;
    Command::new(id, payload)
}

fn decode_phn_frame(bytes: &[u8]) -> Result<Command> {
    let id = CommandId::from_byte(SubProtocol::Phn, bytes[0])?;
    let payload = Payload::decode(id.spec().payload, &bytes[1..])?;
    Command::new(id, payload)
}

//! Command definitions
//!
//! A command is an identifier byte plus a payload. Which payload an
//! identifier takes, which sub-protocol frames it and how its reply is
//! parsed all come from one static table.

use bytes::Bytes;

use super::codec::{encode_phn_frame, encode_pns_frame};
use super::constants::{MuteState, PhnFlags, StopInput};
use super::payload::{
    DetailRunControlData, GroupNo, Password, Payload, PayloadKind, RunControlData,
};
use super::response::{
    AckResponse, DetailStatusResponse, PhnAckResponse, ReadResponse, Response, StatusResponse,
};
use crate::error::{PatliteError, Result};

/// Command identifiers (ASCII letters on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    SmartMode = b'T',
    Mute = b'M',
    StopPulseInput = b'P',
    RunControl = b'S',
    DetailRunControl = b'D',
    Clear = b'C',
    Reboot = b'B',
    GetStatus = b'G',
    GetDetailStatus = b'E',
    Write = b'W',
    Read = b'R',
}

impl CommandId {
    /// Table entry for this identifier
    pub fn spec(self) -> &'static CommandSpec {
        let index = match self {
            CommandId::SmartMode => 0,
            CommandId::Mute => 1,
            CommandId::StopPulseInput => 2,
            CommandId::RunControl => 3,
            CommandId::DetailRunControl => 4,
            CommandId::Clear => 5,
            CommandId::Reboot => 6,
            CommandId::GetStatus => 7,
            CommandId::GetDetailStatus => 8,
            CommandId::Write => 9,
            CommandId::Read => 10,
        };
        &COMMAND_TABLE[index]
    }

    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Look up an identifier byte within one sub-protocol
    pub fn from_byte(protocol: SubProtocol, byte: u8) -> Result<Self> {
        COMMAND_TABLE
            .iter()
            .find(|spec| spec.protocol == protocol && spec.id.byte() == byte)
            .map(|spec| spec.id)
            .ok_or_else(|| {
                PatliteError::Protocol(format!(
                    "Unknown {:?} command identifier: 0x{:02x}",
                    protocol, byte
                ))
            })
    }
}

/// The two framings sharing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubProtocol {
    /// Product-tagged, length-prefixed frames
    Pns,
    /// Identifier byte plus at most one data byte
    Phn,
}

/// What the device sends back for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseShape {
    /// Single ACK/NAK byte
    AckNak,
    /// Status block
    Status,
    /// Detailed status block
    DetailStatus,
    /// Three-byte ASCII token
    PhnAck,
    /// Single PHN state byte
    PhnRead,
}

/// Static configuration of one command identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub protocol: SubProtocol,
    pub payload: PayloadKind,
    pub response: ResponseShape,
}

const fn spec(
    id: CommandId,
    name: &'static str,
    protocol: SubProtocol,
    payload: PayloadKind,
    response: ResponseShape,
) -> CommandSpec {
    CommandSpec {
        id,
        name,
        protocol,
        payload,
        response,
    }
}

/// Every supported command, in `CommandId::spec` order
#[rustfmt::skip]
pub const COMMAND_TABLE: [CommandSpec; 11] = [
    spec(CommandId::SmartMode, "SmartMode", SubProtocol::Pns, PayloadKind::SmartModeGroup, ResponseShape::AckNak),
    spec(CommandId::Mute, "Mute", SubProtocol::Pns, PayloadKind::Mute, ResponseShape::AckNak),
    spec(CommandId::StopPulseInput, "StopPulseInput", SubProtocol::Pns, PayloadKind::StopPulseInput, ResponseShape::AckNak),
    spec(CommandId::RunControl, "RunControl", SubProtocol::Pns, PayloadKind::RunControl, ResponseShape::AckNak),
    spec(CommandId::DetailRunControl, "DetailRunControl", SubProtocol::Pns, PayloadKind::DetailRunControl, ResponseShape::AckNak),
    spec(CommandId::Clear, "Clear", SubProtocol::Pns, PayloadKind::Empty, ResponseShape::AckNak),
    spec(CommandId::Reboot, "Reboot", SubProtocol::Pns, PayloadKind::Password, ResponseShape::AckNak),
    spec(CommandId::GetStatus, "GetStatus", SubProtocol::Pns, PayloadKind::Empty, ResponseShape::Status),
    spec(CommandId::GetDetailStatus, "GetDetailStatus", SubProtocol::Pns, PayloadKind::Empty, ResponseShape::DetailStatus),
    spec(CommandId::Write, "Write", SubProtocol::Phn, PayloadKind::GeneralWrite, ResponseShape::PhnAck),
    spec(CommandId::Read, "Read", SubProtocol::Phn, PayloadKind::Empty, ResponseShape::PhnRead),
];

/// A command ready to be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    id: CommandId,
    payload: Payload,
}

impl Command {
    /// Pair an identifier with a payload, rejecting pairings the device
    /// does not define
    pub fn new(id: CommandId, payload: Payload) -> Result<Self> {
        let expected = id.spec().payload;
        let actual = payload.kind();
        if expected != actual {
            return Err(PatliteError::CommandMismatch {
                command: id.name(),
                expected: expected.name(),
                actual: actual.name(),
            });
        }
        Ok(Self { id, payload })
    }

    // -------------------------------------------------------------------------
    // PNS Commands
    // -------------------------------------------------------------------------

    /// Run smart mode for a group
    pub fn smart_mode(group: GroupNo) -> Self {
        Self::paired(CommandId::SmartMode, Payload::SmartModeGroup(group))
    }

    /// Buzzer on/off while smart mode is running
    pub fn mute(mute: MuteState) -> Self {
        Self::paired(CommandId::Mute, Payload::Mute(mute))
    }

    /// STOP input during time trigger mode, trigger input during pulse
    /// trigger mode
    pub fn stop_pulse_input(input: StopInput) -> Self {
        Self::paired(CommandId::StopPulseInput, Payload::StopPulseInput(input))
    }

    /// Signal light mode operation control
    pub fn run_control(data: RunControlData) -> Self {
        Self::paired(CommandId::RunControl, Payload::RunControl(data))
    }

    /// Color-level operation control
    pub fn detail_run_control(data: DetailRunControlData) -> Self {
        Self::paired(CommandId::DetailRunControl, Payload::DetailRunControl(data))
    }

    /// Turn off every LED stage and stop the buzzer
    pub fn clear() -> Self {
        Self::paired(CommandId::Clear, Payload::Empty)
    }

    /// Restart the device
    pub fn reboot(password: &str) -> Result<Self> {
        Ok(Self::paired(
            CommandId::Reboot,
            Payload::Password(Password::new(password)?),
        ))
    }

    /// Input, mode and LED/buzzer state
    pub fn get_status() -> Self {
        Self::paired(CommandId::GetStatus, Payload::Empty)
    }

    /// Status plus MAC address and per-stage colors
    pub fn get_detail_status() -> Self {
        Self::paired(CommandId::GetDetailStatus, Payload::Empty)
    }

    // -------------------------------------------------------------------------
    // PHN Commands
    // -------------------------------------------------------------------------

    /// Set LED stages 1-3 and buzzer patterns 1-2
    pub fn write(flags: PhnFlags) -> Self {
        Self::paired(CommandId::Write, Payload::GeneralWrite(flags))
    }

    /// Read the LED stage 1-3 and buzzer pattern state
    pub fn read() -> Self {
        Self::paired(CommandId::Read, Payload::Empty)
    }

    fn paired(id: CommandId, payload: Payload) -> Self {
        debug_assert_eq!(id.spec().payload, payload.kind());
        Self { id, payload }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn spec(&self) -> &'static CommandSpec {
        self.id.spec()
    }

    pub fn protocol(&self) -> SubProtocol {
        self.spec().protocol
    }

    /// Full wire frame for this command
    pub fn encode(&self) -> Vec<u8> {
        match self.protocol() {
            SubProtocol::Pns => encode_pns_frame(self.id.byte(), &self.payload),
            SubProtocol::Phn => encode_phn_frame(self.id.byte(), &self.payload),
        }
    }

    /// Interpret the raw reply to this command
    pub fn parse_response(&self, raw: Bytes) -> Result<Response> {
        let response = match self.spec().response {
            ResponseShape::AckNak => Response::Ack(AckResponse::parse(raw)?),
            ResponseShape::Status => Response::Status(StatusResponse::parse(raw)?),
            ResponseShape::DetailStatus => {
                Response::DetailStatus(DetailStatusResponse::parse(raw)?)
            }
            ResponseShape::PhnAck => Response::PhnAck(PhnAckResponse::parse(raw)?),
            ResponseShape::PhnRead => Response::PhnRead(ReadResponse::parse(raw)?),
        };
        Ok(response)
    }
}

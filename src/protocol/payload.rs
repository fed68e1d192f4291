//! Command payloads
//!
//! Each payload knows its own wire bytes and, for PNS framing, its declared
//! length. The enum is closed: a command identifier accepts exactly one
//! `PayloadKind` (see `command::COMMAND_TABLE`).

use std::fmt;

use bytes::BufMut;

use super::constants::{
    Blink, BuzzerPattern, BuzzerState, LedColor, LedState, MuteState, PhnFlags, StopInput,
    LED_STAGES,
};
use crate::error::{PatliteError, Result};

// =============================================================================
// Payload Fields
// =============================================================================

/// Smart mode group number (1-31)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupNo(u8);

impl GroupNo {
    pub const MIN: u8 = 0x01;
    pub const MAX: u8 = 0x1F;

    pub fn new(group: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&group) {
            return Err(PatliteError::Encoding(format!(
                "Smart mode group must be {}-{}, got {}",
                Self::MIN,
                Self::MAX,
                group
            )));
        }
        Ok(GroupNo(group))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Operation control: five LED stage patterns and a buzzer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunControlData {
    pub leds: [LedState; LED_STAGES],
    pub buzzer: BuzzerState,
}

impl RunControlData {
    pub const SIZE: u16 = 6;

    pub fn new(leds: [LedState; LED_STAGES], buzzer: BuzzerState) -> Self {
        Self { leds, buzzer }
    }
}

/// Detailed operation control: five stage colors, one blink flag for the
/// whole stack, and a buzzer pattern
///
/// The device takes a single blink byte after the colors, not one per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRunControlData {
    pub colors: [LedColor; LED_STAGES],
    pub blink: Blink,
    pub buzzer: BuzzerPattern,
}

impl DetailRunControlData {
    pub const SIZE: u16 = 7;

    pub fn new(colors: [LedColor; LED_STAGES], blink: Blink, buzzer: BuzzerPattern) -> Self {
        Self {
            colors,
            blink,
            buzzer,
        }
    }
}

/// ASCII password sent with the reboot command
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Result<Self> {
        let password = password.into();
        if !password.is_ascii() {
            return Err(PatliteError::Encoding(
                "Password must contain only ASCII characters".to_string(),
            ));
        }
        if password.len() > u16::MAX as usize {
            return Err(PatliteError::Encoding(format!(
                "Password too long: {} bytes (max {})",
                password.len(),
                u16::MAX
            )));
        }
        Ok(Password(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password(<{} bytes>)", self.0.len())
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Discriminant of `Payload`, used by the command table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Empty,
    SmartModeGroup,
    Mute,
    StopPulseInput,
    RunControl,
    DetailRunControl,
    Password,
    GeneralWrite,
}

impl PayloadKind {
    pub fn name(self) -> &'static str {
        match self {
            PayloadKind::Empty => "Empty",
            PayloadKind::SmartModeGroup => "SmartModeGroup",
            PayloadKind::Mute => "Mute",
            PayloadKind::StopPulseInput => "StopPulseInput",
            PayloadKind::RunControl => "RunControl",
            PayloadKind::DetailRunControl => "DetailRunControl",
            PayloadKind::Password => "Password",
            PayloadKind::GeneralWrite => "GeneralWrite",
        }
    }
}

/// A command payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No data area
    Empty,

    /// Smart mode group to execute
    SmartModeGroup(GroupNo),

    /// Buzzer on/off during smart mode
    Mute(MuteState),

    /// STOP input / trigger input
    StopPulseInput(StopInput),

    /// LED stage patterns and buzzer state
    RunControl(RunControlData),

    /// LED stage colors, shared blink flag, buzzer pattern
    DetailRunControl(DetailRunControlData),

    /// Reboot password
    Password(Password),

    /// PHN write flags
    GeneralWrite(PhnFlags),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Empty => PayloadKind::Empty,
            Payload::SmartModeGroup(_) => PayloadKind::SmartModeGroup,
            Payload::Mute(_) => PayloadKind::Mute,
            Payload::StopPulseInput(_) => PayloadKind::StopPulseInput,
            Payload::RunControl(_) => PayloadKind::RunControl,
            Payload::DetailRunControl(_) => PayloadKind::DetailRunControl,
            Payload::Password(_) => PayloadKind::Password,
            Payload::GeneralWrite(_) => PayloadKind::GeneralWrite,
        }
    }

    /// Length written into the PNS frame header
    pub fn declared_length(&self) -> u16 {
        match self {
            Payload::Empty => 0,
            Payload::SmartModeGroup(_)
            | Payload::Mute(_)
            | Payload::StopPulseInput(_)
            | Payload::GeneralWrite(_) => 1,
            Payload::RunControl(_) => RunControlData::SIZE,
            Payload::DetailRunControl(_) => DetailRunControlData::SIZE,
            // Bounded by Password::new
            Payload::Password(password) => password.0.len() as u16,
        }
    }

    /// Encode the data area
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.declared_length() as usize);

        match self {
            Payload::Empty => {}
            Payload::SmartModeGroup(group) => buf.put_u8(group.get()),
            Payload::Mute(mute) => buf.put_u8(u8::from(*mute)),
            Payload::StopPulseInput(input) => buf.put_u8(u8::from(*input)),
            Payload::RunControl(data) => {
                for led in data.leds {
                    buf.put_u8(u8::from(led));
                }
                buf.put_u8(u8::from(data.buzzer));
            }
            Payload::DetailRunControl(data) => {
                for color in data.colors {
                    buf.put_u8(u8::from(color));
                }
                buf.put_u8(u8::from(data.blink));
                buf.put_u8(u8::from(data.buzzer));
            }
            Payload::Password(password) => buf.put_slice(password.0.as_bytes()),
            Payload::GeneralWrite(flags) => buf.put_u8(flags.bits()),
        }

        buf
    }

    /// Decode a data area of the given kind
    ///
    /// The slice must be exactly the payload, with no trailing bytes.
    pub fn decode(kind: PayloadKind, bytes: &[u8]) -> Result<Payload> {
        match kind {
            PayloadKind::Empty => {
                expect_len(kind, bytes, 0)?;
                Ok(Payload::Empty)
            }
            PayloadKind::SmartModeGroup => {
                expect_len(kind, bytes, 1)?;
                GroupNo::new(bytes[0])
                    .map(Payload::SmartModeGroup)
                    .map_err(|e| PatliteError::Protocol(e.to_string()))
            }
            PayloadKind::Mute => {
                expect_len(kind, bytes, 1)?;
                Ok(Payload::Mute(MuteState::try_from(bytes[0])?))
            }
            PayloadKind::StopPulseInput => {
                expect_len(kind, bytes, 1)?;
                Ok(Payload::StopPulseInput(StopInput::try_from(bytes[0])?))
            }
            PayloadKind::RunControl => {
                expect_len(kind, bytes, RunControlData::SIZE as usize)?;
                let mut leds = [LedState::Off; LED_STAGES];
                for (led, byte) in leds.iter_mut().zip(bytes) {
                    *led = LedState::try_from(*byte)?;
                }
                Ok(Payload::RunControl(RunControlData {
                    leds,
                    buzzer: BuzzerState::try_from(bytes[5])?,
                }))
            }
            PayloadKind::DetailRunControl => {
                expect_len(kind, bytes, DetailRunControlData::SIZE as usize)?;
                let mut colors = [LedColor::Off; LED_STAGES];
                for (color, byte) in colors.iter_mut().zip(bytes) {
                    *color = LedColor::try_from(*byte)?;
                }
                Ok(Payload::DetailRunControl(DetailRunControlData {
                    colors,
                    blink: Blink::try_from(bytes[5])?,
                    buzzer: BuzzerPattern::try_from(bytes[6])?,
                }))
            }
            PayloadKind::Password => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| PatliteError::Protocol("Password is not ASCII".to_string()))?;
                Password::new(text)
                    .map(Payload::Password)
                    .map_err(|e| PatliteError::Protocol(e.to_string()))
            }
            PayloadKind::GeneralWrite => {
                expect_len(kind, bytes, 1)?;
                Ok(Payload::GeneralWrite(PhnFlags::from_bits(bytes[0])))
            }
        }
    }
}

fn expect_len(kind: PayloadKind, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(PatliteError::Protocol(format!(
            "{} payload: expected {} bytes, got {}",
            kind.name(),
            expected,
            bytes.len()
        )));
    }
    Ok(())
}

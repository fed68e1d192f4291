//! Wire constants and closed value sets
//!
//! Every enum here is `#[repr(u8)]` and converts losslessly to its wire byte.
//! Conversion back from a byte is fallible and reports a protocol error.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::PatliteError;

// =============================================================================
// Wire Constants
// =============================================================================

/// Product category tag that opens every PNS frame
pub const PRODUCT_CATEGORY: [u8; 2] = *b"AB";

/// PNS acknowledgment byte
pub const PNS_ACK: u8 = 0x06;

/// PNS negative-acknowledgment byte
pub const PNS_NAK: u8 = 0x15;

/// PHN acknowledgment token
pub const PHN_ACK: [u8; 3] = *b"ACK";

/// PHN negative-acknowledgment token
pub const PHN_NAK: [u8; 3] = *b"NAK";

/// Maximum bytes taken from the transport per response
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

/// Number of addressable LED stages in a PNS light stack
pub const LED_STAGES: usize = 5;

// =============================================================================
// Closed Enumerations
// =============================================================================

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Every variant, in wire-value order
            pub const ALL: &'static [$name] = &[$( $name::$variant, )+];

            /// Lowercase name used by the CLI and `Display`
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = PatliteError;

            fn try_from(byte: u8) -> Result<Self, Self::Error> {
                match byte {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(PatliteError::Protocol(format!(
                        "Unknown {} value: 0x{:02x}",
                        $label, byte
                    ))),
                }
            }
        }

        impl FromStr for $name {
            type Err = PatliteError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                if let Some(found) = $name::ALL.iter().find(|v| v.name() == lowered) {
                    return Ok(*found);
                }
                lowered
                    .parse::<u8>()
                    .map_err(|_| PatliteError::Encoding(format!("Unknown {}: {:?}", $label, s)))
                    .and_then($name::try_from)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

wire_enum! {
    /// LED stage pattern for operation control
    LedState, "LED state" {
        Off = 0x00 => "off",
        On = 0x01 => "on",
        Blinking = 0x02 => "blinking",
        NoChange = 0x09 => "no-change",
    }
}

wire_enum! {
    /// Buzzer state for operation control
    BuzzerState, "buzzer state" {
        Stop = 0x00 => "stop",
        Pattern1 = 0x01 => "pattern1",
        Pattern2 = 0x02 => "pattern2",
        /// Buzzer tone when input simultaneously with the buzzer
        Tone = 0x03 => "tone",
        NoChange = 0x09 => "no-change",
    }
}

wire_enum! {
    /// LED stage color for detailed operation control
    LedColor, "LED color" {
        Off = 0x00 => "off",
        Red = 0x01 => "red",
        Yellow = 0x02 => "yellow",
        Lemon = 0x03 => "lemon",
        Green = 0x04 => "green",
        SkyBlue = 0x05 => "sky-blue",
        Blue = 0x06 => "blue",
        Purple = 0x07 => "purple",
        Peach = 0x08 => "peach",
        White = 0x09 => "white",
    }
}

wire_enum! {
    /// Buzzer pattern for detailed operation control
    BuzzerPattern, "buzzer pattern" {
        Stop = 0x00 => "stop",
        Pattern1 = 0x01 => "pattern1",
        Pattern2 = 0x02 => "pattern2",
        Pattern3 = 0x03 => "pattern3",
        Pattern4 = 0x04 => "pattern4",
        Pattern5 = 0x05 => "pattern5",
        Pattern6 = 0x06 => "pattern6",
        Pattern7 = 0x07 => "pattern7",
        Pattern8 = 0x08 => "pattern8",
        Pattern9 = 0x09 => "pattern9",
        Pattern10 = 0x0A => "pattern10",
        Pattern11 = 0x0B => "pattern11",
    }
}

wire_enum! {
    /// Blinking flag for detailed operation control
    Blink, "blink flag" {
        Off = 0x00 => "off",
        On = 0x01 => "on",
    }
}

wire_enum! {
    /// Operating mode reported by the status commands
    Mode, "mode" {
        /// Signal light mode
        Led = 0x00 => "led",
        /// Smart mode (group-triggered patterns)
        Smart = 0x01 => "smart",
    }
}

wire_enum! {
    /// Buzzer mute while smart mode is running
    MuteState, "mute state" {
        Off = 0x00 => "off",
        On = 0x01 => "on",
    }
}

wire_enum! {
    /// STOP input / trigger input selector
    StopInput, "stop input" {
        /// STOP input
        Stop = 0x00 => "stop",
        /// STOP input ON (time trigger) / trigger input (pulse trigger)
        Trigger = 0x01 => "trigger",
    }
}

// =============================================================================
// PHN Flags
// =============================================================================

/// Bit-set carried by the PHN write command and read response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhnFlags(u8);

impl PhnFlags {
    pub const EMPTY: PhnFlags = PhnFlags(0x00);
    pub const LED_UNIT1_LIGHTING: PhnFlags = PhnFlags(0x01);
    pub const LED_UNIT2_LIGHTING: PhnFlags = PhnFlags(0x02);
    pub const LED_UNIT3_LIGHTING: PhnFlags = PhnFlags(0x04);
    pub const BUZZER_PATTERN1: PhnFlags = PhnFlags(0x08);
    pub const BUZZER_PATTERN2: PhnFlags = PhnFlags(0x10);
    pub const LED_UNIT1_BLINKING: PhnFlags = PhnFlags(0x20);
    pub const LED_UNIT2_BLINKING: PhnFlags = PhnFlags(0x40);
    pub const LED_UNIT3_BLINKING: PhnFlags = PhnFlags(0x80);

    /// Named flags, lowest bit first
    pub const NAMED: [(PhnFlags, &'static str); 8] = [
        (PhnFlags::LED_UNIT1_LIGHTING, "led1-lighting"),
        (PhnFlags::LED_UNIT2_LIGHTING, "led2-lighting"),
        (PhnFlags::LED_UNIT3_LIGHTING, "led3-lighting"),
        (PhnFlags::BUZZER_PATTERN1, "buzzer-pattern1"),
        (PhnFlags::BUZZER_PATTERN2, "buzzer-pattern2"),
        (PhnFlags::LED_UNIT1_BLINKING, "led1-blinking"),
        (PhnFlags::LED_UNIT2_BLINKING, "led2-blinking"),
        (PhnFlags::LED_UNIT3_BLINKING, "led3-blinking"),
    ];

    /// Every bit pattern is meaningful, so this never fails
    pub const fn from_bits(bits: u8) -> Self {
        PhnFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: PhnFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PhnFlags {
    type Output = PhnFlags;

    fn bitor(self, rhs: PhnFlags) -> PhnFlags {
        PhnFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PhnFlags {
    fn bitor_assign(&mut self, rhs: PhnFlags) {
        self.0 |= rhs.0;
    }
}

impl FromStr for PhnFlags {
    type Err = PatliteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        PhnFlags::NAMED
            .iter()
            .find(|(_, name)| *name == lowered)
            .map(|(flag, _)| *flag)
            .ok_or_else(|| PatliteError::Encoding(format!("Unknown PHN flag: {:?}", s)))
    }
}

impl fmt::Display for PhnFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in PhnFlags::NAMED.iter() {
            if self.contains(*flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

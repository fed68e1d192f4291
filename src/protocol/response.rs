//! Response definitions
//!
//! Typed views over the bytes returned by one transport read. Parsers are
//! strict: the body must be exactly as long as its mode requires.

use std::fmt;

use bytes::{Buf, Bytes};

use super::constants::{Mode, PhnFlags, LED_STAGES, PHN_NAK, PNS_ACK, PNS_NAK};
use crate::error::{PatliteError, Result};

/// Number of signal/contact input bytes
pub const INPUT_LEN: usize = 8;

/// Input bytes + mode byte
pub const STATUS_HEADER_LEN: usize = INPUT_LEN + 1;
pub const LED_MODE_STATE_LEN: usize = 6;
pub const SMART_MODE_STATE_LEN: usize = 4;

pub const MAC_ADDRESS_LEN: usize = 6;
/// Reserved bytes between the mode byte and the detail state
pub const DETAIL_RESERVED_LEN: usize = 4;
/// MAC + input + mode + reserved
pub const DETAIL_HEADER_LEN: usize = MAC_ADDRESS_LEN + INPUT_LEN + 1 + DETAIL_RESERVED_LEN;
pub const LED_UNIT_LEN: usize = 4;
pub const SMART_MODE_DETAIL_LEN: usize = 5;
pub const LED_MODE_DETAIL_STATE_LEN: usize = LED_STAGES * LED_UNIT_LEN + 1;
pub const SMART_MODE_DETAIL_STATE_LEN: usize = SMART_MODE_DETAIL_LEN + LED_MODE_DETAIL_STATE_LEN;

// =============================================================================
// Response
// =============================================================================

/// A parsed device reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// PNS single-byte ACK/NAK
    Ack(AckResponse),

    /// PNS status block
    Status(StatusResponse),

    /// PNS detailed status block
    DetailStatus(DetailStatusResponse),

    /// PHN write token
    PhnAck(PhnAckResponse),

    /// PHN read state byte
    PhnRead(ReadResponse),
}

impl Response {
    /// Whether the device rejected the command
    ///
    /// Status replies carry no acknowledgment and are never negative.
    pub fn is_negative_ack(&self) -> bool {
        match self {
            Response::Ack(r) => r.is_negative_ack(),
            Response::PhnAck(r) => r.is_negative_ack(),
            Response::PhnRead(r) => r.is_negative_ack(),
            Response::Status(_) | Response::DetailStatus(_) => false,
        }
    }

    /// Bytes exactly as read from the transport
    pub fn raw(&self) -> &Bytes {
        match self {
            Response::Ack(r) => &r.raw,
            Response::Status(r) => &r.raw,
            Response::DetailStatus(r) => &r.raw,
            Response::PhnAck(r) => &r.raw,
            Response::PhnRead(r) => &r.raw,
        }
    }

    pub fn into_status(self) -> Result<StatusResponse> {
        match self {
            Response::Status(r) => Ok(r),
            other => Err(unexpected_shape("status", &other)),
        }
    }

    pub fn into_detail_status(self) -> Result<DetailStatusResponse> {
        match self {
            Response::DetailStatus(r) => Ok(r),
            other => Err(unexpected_shape("detail status", &other)),
        }
    }

    pub fn into_read(self) -> Result<ReadResponse> {
        match self {
            Response::PhnRead(r) => Ok(r),
            other => Err(unexpected_shape("read", &other)),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ack(r) => fmt::Display::fmt(r, f),
            Response::Status(r) => fmt::Display::fmt(r, f),
            Response::DetailStatus(r) => fmt::Display::fmt(r, f),
            Response::PhnAck(r) => fmt::Display::fmt(r, f),
            Response::PhnRead(r) => fmt::Display::fmt(r, f),
        }
    }
}

fn unexpected_shape(wanted: &str, got: &Response) -> PatliteError {
    let name = match got {
        Response::Ack(_) => "ack",
        Response::Status(_) => "status",
        Response::DetailStatus(_) => "detail status",
        Response::PhnAck(_) => "PHN ack",
        Response::PhnRead(_) => "read",
    };
    PatliteError::Protocol(format!("Expected {} response, got {}", wanted, name))
}

fn require_non_empty(what: &str, raw: &Bytes) -> Result<()> {
    if raw.is_empty() {
        return Err(PatliteError::Protocol(format!("Empty {} response", what)));
    }
    Ok(())
}

// =============================================================================
// Acknowledgments
// =============================================================================

/// PNS reply to a control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckResponse {
    raw: Bytes,
}

impl AckResponse {
    pub fn parse(raw: Bytes) -> Result<Self> {
        require_non_empty("PNS ack", &raw)?;
        Ok(Self { raw })
    }

    pub fn is_negative_ack(&self) -> bool {
        self.raw[0] == PNS_NAK
    }

    pub fn is_ack(&self) -> bool {
        self.raw[0] == PNS_ACK
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl fmt::Display for AckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw[0] {
            PNS_ACK => f.write_str("ACK"),
            PNS_NAK => f.write_str("NAK"),
            other => write!(f, "unknown reply 0x{:02x}", other),
        }
    }
}

/// PHN reply to a write command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhnAckResponse {
    raw: Bytes,
}

impl PhnAckResponse {
    pub fn parse(raw: Bytes) -> Result<Self> {
        require_non_empty("PHN ack", &raw)?;
        Ok(Self { raw })
    }

    /// Only the first byte of the token is compared
    pub fn is_negative_ack(&self) -> bool {
        self.raw[0] == PHN_NAK[0]
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl fmt::Display for PhnAckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.raw))
    }
}

/// PHN reply to a read command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    raw: Bytes,
}

impl ReadResponse {
    /// ASCII code the read reply is checked against
    pub const READ_ECHO: u8 = b'R';

    pub fn parse(raw: Bytes) -> Result<Self> {
        require_non_empty("PHN read", &raw)?;
        Ok(Self { raw })
    }

    /// Device state as reported in the first byte
    pub fn flags(&self) -> PhnFlags {
        PhnFlags::from_bits(self.raw[0])
    }

    /// True when the first byte differs from `b'R'`
    ///
    /// A state byte is not an echo, so most successful reads report true
    /// here. Use `flags()` for the actual state.
    pub fn is_negative_ack(&self) -> bool {
        self.raw[0] != Self::READ_ECHO
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl fmt::Display for ReadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.flags();
        let bit = |flag: PhnFlags| u8::from(flags.contains(flag));
        writeln!(f, "LED unit blinking:")?;
        writeln!(f, "  1st LED unit : {}", bit(PhnFlags::LED_UNIT1_BLINKING))?;
        writeln!(f, "  2nd LED unit : {}", bit(PhnFlags::LED_UNIT2_BLINKING))?;
        writeln!(f, "  3rd LED unit : {}", bit(PhnFlags::LED_UNIT3_BLINKING))?;
        writeln!(f, "Buzzer pattern:")?;
        writeln!(f, "  pattern1 : {}", bit(PhnFlags::BUZZER_PATTERN1))?;
        writeln!(f, "  pattern2 : {}", bit(PhnFlags::BUZZER_PATTERN2))?;
        writeln!(f, "LED unit lighting:")?;
        writeln!(f, "  1st LED unit : {}", bit(PhnFlags::LED_UNIT1_LIGHTING))?;
        writeln!(f, "  2nd LED unit : {}", bit(PhnFlags::LED_UNIT2_LIGHTING))?;
        write!(f, "  3rd LED unit : {}", bit(PhnFlags::LED_UNIT3_LIGHTING))
    }
}

// =============================================================================
// Status
// =============================================================================

/// Signal light mode state: five stage patterns and the buzzer pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedModeState {
    pub led_patterns: [u8; LED_STAGES],
    pub buzzer_pattern: u8,
}

impl LedModeState {
    fn read(buf: &mut Bytes) -> Self {
        let mut led_patterns = [0u8; LED_STAGES];
        buf.copy_to_slice(&mut led_patterns);
        Self {
            led_patterns,
            buzzer_pattern: buf.get_u8(),
        }
    }
}

/// Smart mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartModeState {
    pub group_no: u8,
    pub mute: u8,
    pub stop_input: u8,
    pub pattern_no: u8,
}

impl SmartModeState {
    fn read(buf: &mut Bytes) -> Self {
        Self {
            group_no: buf.get_u8(),
            mute: buf.get_u8(),
            stop_input: buf.get_u8(),
            pattern_no: buf.get_u8(),
        }
    }
}

/// Mode-specific part of a status reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    Led(LedModeState),
    Smart(SmartModeState),
}

/// Reply to GetStatus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    raw: Bytes,
    input: [u8; INPUT_LEN],
    state: ModeState,
}

impl StatusResponse {
    /// Parse `input (8) | mode (1) | led state (6) or smart state (4)`
    pub fn parse(raw: Bytes) -> Result<Self> {
        if raw.len() < STATUS_HEADER_LEN {
            return Err(PatliteError::Protocol(format!(
                "Incomplete status response: expected at least {} bytes, got {}",
                STATUS_HEADER_LEN,
                raw.len()
            )));
        }

        let mode = Mode::try_from(raw[INPUT_LEN])?;
        let body_len = match mode {
            Mode::Led => LED_MODE_STATE_LEN,
            Mode::Smart => SMART_MODE_STATE_LEN,
        };
        expect_exact("status", mode, STATUS_HEADER_LEN + body_len, raw.len())?;

        let mut buf = raw.clone();
        let mut input = [0u8; INPUT_LEN];
        buf.copy_to_slice(&mut input);
        buf.advance(1);

        let state = match mode {
            Mode::Led => ModeState::Led(LedModeState::read(&mut buf)),
            Mode::Smart => ModeState::Smart(SmartModeState::read(&mut buf)),
        };

        Ok(Self { raw, input, state })
    }

    /// Signal/contact input bytes
    pub fn input(&self) -> &[u8; INPUT_LEN] {
        &self.input
    }

    /// Operating mode, as implied by the parsed state
    pub fn mode(&self) -> Mode {
        match self.state {
            ModeState::Led(_) => Mode::Led,
            ModeState::Smart(_) => Mode::Smart,
        }
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    /// Present only in signal light mode
    pub fn led_mode_data(&self) -> Option<&LedModeState> {
        match &self.state {
            ModeState::Led(state) => Some(state),
            ModeState::Smart(_) => None,
        }
    }

    /// Present only in smart mode
    pub fn smart_mode_data(&self) -> Option<&SmartModeState> {
        match &self.state {
            ModeState::Smart(state) => Some(state),
            ModeState::Led(_) => None,
        }
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input: {:?}", self.input)?;
        writeln!(f, "mode: {}", self.mode())?;
        match &self.state {
            ModeState::Led(s) => write!(
                f,
                "led patterns: {:?}, buzzer pattern: {}",
                s.led_patterns, s.buzzer_pattern
            ),
            ModeState::Smart(s) => write!(
                f,
                "group: {}, mute: {}, stop input: {}, pattern: {}",
                s.group_no, s.mute, s.stop_input, s.pattern_no
            ),
        }
    }
}

// =============================================================================
// Detailed Status
// =============================================================================

/// Device MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; MAC_ADDRESS_LEN]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One LED stage: pattern and RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedUnitData {
    pub pattern: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl LedUnitData {
    /// Parse a 4-byte stage block
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != LED_UNIT_LEN {
            return Err(PatliteError::Protocol(format!(
                "LED unit block: expected {} bytes, got {}",
                LED_UNIT_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            pattern: bytes[0],
            red: bytes[1],
            green: bytes[2],
            blue: bytes[3],
        })
    }

    fn read(buf: &mut Bytes) -> Self {
        Self {
            pattern: buf.get_u8(),
            red: buf.get_u8(),
            green: buf.get_u8(),
            blue: buf.get_u8(),
        }
    }
}

impl fmt::Display for LedUnitData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern {} rgb({}, {}, {})",
            self.pattern, self.red, self.green, self.blue
        )
    }
}

fn read_units(buf: &mut Bytes) -> [LedUnitData; LED_STAGES] {
    let mut units = [LedUnitData::default(); LED_STAGES];
    for unit in units.iter_mut() {
        *unit = LedUnitData::read(buf);
    }
    units
}

/// Detailed signal light mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedModeDetailState {
    pub led_units: [LedUnitData; LED_STAGES],
    pub buzzer_pattern: u8,
}

/// Smart mode block of the detailed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartModeDetail {
    pub group_no: u8,
    pub mute: u8,
    pub stop_input: u8,
    pub pattern_no: u8,
    pub last_pattern: u8,
}

/// Detailed smart mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartModeDetailState {
    pub smart_mode: SmartModeDetail,
    pub led_units: [LedUnitData; LED_STAGES],
    pub buzzer_pattern: u8,
}

/// Mode-specific part of a detailed status reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailModeState {
    Led(LedModeDetailState),
    Smart(SmartModeDetailState),
}

impl DetailModeState {
    pub fn led_units(&self) -> &[LedUnitData; LED_STAGES] {
        match self {
            DetailModeState::Led(s) => &s.led_units,
            DetailModeState::Smart(s) => &s.led_units,
        }
    }

    pub fn buzzer_pattern(&self) -> u8 {
        match self {
            DetailModeState::Led(s) => s.buzzer_pattern,
            DetailModeState::Smart(s) => s.buzzer_pattern,
        }
    }
}

/// Reply to GetDetailStatus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailStatusResponse {
    raw: Bytes,
    mac_address: MacAddress,
    input: [u8; INPUT_LEN],
    state: DetailModeState,
}

impl DetailStatusResponse {
    /// Parse `mac (6) | input (8) | mode (1) | reserved (4) | detail state`
    pub fn parse(raw: Bytes) -> Result<Self> {
        if raw.len() < DETAIL_HEADER_LEN {
            return Err(PatliteError::Protocol(format!(
                "Incomplete detail status response: expected at least {} bytes, got {}",
                DETAIL_HEADER_LEN,
                raw.len()
            )));
        }

        let mode = Mode::try_from(raw[MAC_ADDRESS_LEN + INPUT_LEN])?;
        let body_len = match mode {
            Mode::Led => LED_MODE_DETAIL_STATE_LEN,
            Mode::Smart => SMART_MODE_DETAIL_STATE_LEN,
        };
        expect_exact("detail status", mode, DETAIL_HEADER_LEN + body_len, raw.len())?;

        let mut buf = raw.clone();
        let mut mac = [0u8; MAC_ADDRESS_LEN];
        buf.copy_to_slice(&mut mac);
        let mut input = [0u8; INPUT_LEN];
        buf.copy_to_slice(&mut input);
        buf.advance(1 + DETAIL_RESERVED_LEN);

        let state = match mode {
            Mode::Led => {
                let led_units = read_units(&mut buf);
                DetailModeState::Led(LedModeDetailState {
                    led_units,
                    buzzer_pattern: buf.get_u8(),
                })
            }
            Mode::Smart => {
                let smart_mode = SmartModeDetail {
                    group_no: buf.get_u8(),
                    mute: buf.get_u8(),
                    stop_input: buf.get_u8(),
                    pattern_no: buf.get_u8(),
                    last_pattern: buf.get_u8(),
                };
                let led_units = read_units(&mut buf);
                DetailModeState::Smart(SmartModeDetailState {
                    smart_mode,
                    led_units,
                    buzzer_pattern: buf.get_u8(),
                })
            }
        };

        Ok(Self {
            raw,
            mac_address: MacAddress(mac),
            input,
            state,
        })
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    pub fn input(&self) -> &[u8; INPUT_LEN] {
        &self.input
    }

    /// Operating mode, as implied by the parsed state
    pub fn mode(&self) -> Mode {
        match self.state {
            DetailModeState::Led(_) => Mode::Led,
            DetailModeState::Smart(_) => Mode::Smart,
        }
    }

    pub fn state(&self) -> &DetailModeState {
        &self.state
    }

    pub fn led_mode_detail_data(&self) -> Option<&LedModeDetailState> {
        match &self.state {
            DetailModeState::Led(state) => Some(state),
            DetailModeState::Smart(_) => None,
        }
    }

    pub fn smart_mode_detail_data(&self) -> Option<&SmartModeDetailState> {
        match &self.state {
            DetailModeState::Smart(state) => Some(state),
            DetailModeState::Led(_) => None,
        }
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl fmt::Display for DetailStatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mac address: {}", self.mac_address)?;
        writeln!(f, "input: {:?}", self.input)?;
        writeln!(f, "mode: {}", self.mode())?;
        if let DetailModeState::Smart(s) = &self.state {
            let m = &s.smart_mode;
            writeln!(
                f,
                "group: {}, mute: {}, stop input: {}, pattern: {}, last pattern: {}",
                m.group_no, m.mute, m.stop_input, m.pattern_no, m.last_pattern
            )?;
        }
        for (stage, unit) in self.state.led_units().iter().enumerate() {
            writeln!(f, "led unit {}: {}", stage + 1, unit)?;
        }
        write!(f, "buzzer pattern: {}", self.state.buzzer_pattern())
    }
}

fn expect_exact(what: &str, mode: Mode, expected: usize, got: usize) -> Result<()> {
    if got != expected {
        return Err(PatliteError::Protocol(format!(
            "{} response in {} mode: expected {} bytes, got {}",
            what, mode, expected, got
        )));
    }
    Ok(())
}

//! Protocol Module
//!
//! Defines the two sub-protocols spoken by the signal tower.
//!
//! ## PNS (product-tagged, length-prefixed)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬────────┬─────────┬──────────┬───────────────────┐
//! │ "AB" (2) │ Id (1) │ Pad (1) │ Len (2)  │  Payload (Len)    │
//! └──────────┴────────┴─────────┴──────────┴───────────────────┘
//! ```
//!
//! ### Commands
//! - `T`: SmartMode        - Payload: group number (1)
//! - `M`: Mute             - Payload: mute (1)
//! - `P`: StopPulseInput   - Payload: input mode (1)
//! - `S`: RunControl       - Payload: 5 LED patterns + buzzer (6)
//! - `D`: DetailRunControl - Payload: 5 LED colors + blink + buzzer pattern (7)
//! - `C`: Clear            - Payload: empty
//! - `B`: Reboot           - Payload: ASCII password
//! - `G`: GetStatus        - Payload: empty
//! - `E`: GetDetailStatus  - Payload: empty
//!
//! ### Responses
//! - 0x06: ACK
//! - 0x15: NAK
//! - `G`/`E` reply with a status block instead of an ACK byte
//!
//! ## PHN (single-byte commands)
//!
//! - `W` + flags (1): reply is the ASCII token `ACK` or `NAK`
//! - `R`: reply is one state byte carrying the same flags

mod codec;
mod command;
mod constants;
mod payload;
mod response;

pub use codec::{decode_frame, encode_phn_frame, encode_pns_frame, PNS_HEADER_SIZE, PNS_PAD};
pub use command::{Command, CommandId, CommandSpec, ResponseShape, SubProtocol, COMMAND_TABLE};
pub use constants::{
    Blink, BuzzerPattern, BuzzerState, LedColor, LedState, Mode, MuteState, PhnFlags, StopInput,
    DEFAULT_RECV_BUFFER_SIZE, LED_STAGES, PHN_ACK, PHN_NAK, PNS_ACK, PNS_NAK, PRODUCT_CATEGORY,
};
pub use payload::{
    DetailRunControlData, GroupNo, Password, Payload, PayloadKind, RunControlData,
};
pub use response::{
    AckResponse, DetailModeState, DetailStatusResponse, LedModeDetailState, LedModeState,
    LedUnitData, MacAddress, ModeState, PhnAckResponse, ReadResponse, Response,
    SmartModeDetail, SmartModeDetailState, SmartModeState, StatusResponse,
    DETAIL_HEADER_LEN, LED_MODE_DETAIL_STATE_LEN, SMART_MODE_DETAIL_STATE_LEN,
    STATUS_HEADER_LEN,
};

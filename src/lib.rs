//! # patlite
//!
//! Command/response codec and client for networked signal-tower lights:
//! - PNS: product-tagged, length-prefixed commands with ACK/NAK or status replies
//! - PHN: single-byte write/read commands
//! - Blocking request/response over one owned TCP connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Caller                                │
//! │          (builds Payload → Command, reads Response)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  PatliteControl                             │
//! │        (Unopened → Open → Closed, one command at a time)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Command   │          │  Transport  │
//!   │(frame/parse)│          │ (send/recv) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use patlite::protocol::{BuzzerState, Command, LedState, RunControlData};
//! use patlite::PatliteControl;
//!
//! let mut control = PatliteControl::new("192.168.10.1", 10000)?;
//! let response = control.session(|ctl| {
//!     let data = RunControlData::new([LedState::On; 5], BuzzerState::Stop);
//!     ctl.send_command(&Command::run_control(data))
//! })?;
//! assert!(!response.is_negative_ack());
//! # Ok::<(), patlite::PatliteError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod validation;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PatliteError, Result};
pub use config::Config;
pub use network::{ConnectionState, PatliteControl};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of patlite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Wire protocol between the page and the device.
//!
//! # Frames
//!
//! ```text
//! Page                                   Device
//! ───────────────────────────────────────────────────
//!   "alive?"  ─────────────────────────►           (probe)
//!             ◄─────────────────────────  "alive"  (ack)
//!   "b0100"   ─────────────────────────►           (key state)
//!             ◄─────────────────────────  [u8; 96] (LED frame)
//! ```
//!
//! Text frames carry the heartbeat and key state; binary frames carry LED
//! colours. Anything else is ignored.

use crate::constants::{ACK, PROBE, SOCKET_PATH};
use crate::flags::FlagArray;

/// A frame received from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Liveness acknowledgment.
    Ack,
    /// Binary LED state.
    Led(&'a [u8]),
    /// Any frame the page does not understand.
    Ignored,
}

impl<'a> Inbound<'a> {
    /// Classify a text frame.
    pub fn from_text(text: &str) -> Inbound<'static> {
        if text == ACK {
            Inbound::Ack
        } else {
            Inbound::Ignored
        }
    }

    /// Classify a binary frame; empty payloads carry nothing.
    pub fn from_binary(data: &'a [u8]) -> Self {
        if data.is_empty() {
            Inbound::Ignored
        } else {
            Inbound::Led(data)
        }
    }
}

/// A frame sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Liveness probe.
    Probe,
    /// Current key state.
    Keys(FlagArray),
}

impl Outbound {
    /// Text payload for this frame.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Outbound::Probe => PROBE.to_string(),
            Outbound::Keys(flags) => flags.to_wire(),
        }
    }
}

/// WebSocket endpoint on the page's own host.
///
/// Pages served over `https:` get `wss://`; everything else gets `ws://`.
#[must_use]
pub fn socket_url(page_protocol: &str, host: &str) -> String {
    let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
    format!("{scheme}://{host}{SOCKET_PATH}")
}

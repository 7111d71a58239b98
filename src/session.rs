//! Heartbeat-supervised socket session.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──ack──► Alive
//!      ▲                          │                 │
//!      └──── watchdog: misses > limit ──────────────┘
//!            (close, then connect() again)
//! ```
//!
//! The session owns a [`Transport`] and never touches a real socket
//! itself, which keeps the heartbeat logic testable without a browser.
//! The host feeds socket events in through the `on_*` methods and calls
//! [`SocketSession::tick`] from a periodic timer.
//!
//! Every tick counts as a miss until an `alive` ack resets the counter, so
//! unanswered probes accumulate toward the reconnect threshold. Reconnects
//! are immediate and unlimited.

use crate::error::Result;
use crate::flags::FlagArray;
use crate::protocol::{Inbound, Outbound};

/// Socket operations the session needs from its host.
pub trait Transport {
    /// Open a fresh connection, replacing any previous one.
    ///
    /// Completion is reported later through [`SocketSession::on_open`].
    fn open(&mut self) -> Result<()>;

    /// Send a text frame on the current connection.
    fn send_text(&mut self, text: &str) -> Result<()>;

    /// Force-close the current connection without waiting for a handshake.
    fn close(&mut self);
}

/// Connection state as seen by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection is open.
    #[default]
    Disconnected,
    /// Opened, waiting for the first ack.
    Connecting,
    /// Ack received; key state may be sent.
    Alive,
}

/// What a watchdog tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Sent another probe on a live connection.
    Probed,
    /// Not alive yet; only counted the miss.
    Waiting,
    /// Miss limit exceeded; the connection was torn down and reopened.
    Reconnected,
}

/// Socket connection plus heartbeat bookkeeping.
#[derive(Debug)]
pub struct SocketSession<T> {
    transport: T,
    state: ConnectionState,
    misses: u32,
    miss_limit: u32,
    reconnects: u64,
}

impl<T: Transport> SocketSession<T> {
    pub fn new(transport: T, miss_limit: u32) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            misses: 0,
            miss_limit,
            reconnects: 0,
        }
    }

    /// Open a connection.
    ///
    /// # Errors
    ///
    /// Returns the transport's error; the session stays disconnected and
    /// the watchdog will retry.
    pub fn connect(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;
        if let Err(e) = self.transport.open() {
            self.state = ConnectionState::Disconnected;
            return Err(e);
        }
        log::info!("Socket connecting");
        Ok(())
    }

    /// The connection opened; probe immediately.
    pub fn on_open(&mut self) -> Result<()> {
        log::debug!("Socket open, probing");
        self.transport.send_text(&Outbound::Probe.encode())
    }

    /// Handle a received frame. Returns LED payload bytes, if any.
    pub fn on_inbound<'a>(&mut self, frame: Inbound<'a>) -> Option<&'a [u8]> {
        match frame {
            Inbound::Ack => {
                if self.state != ConnectionState::Alive {
                    log::info!("Socket alive");
                }
                self.misses = 0;
                self.state = ConnectionState::Alive;
                None
            }
            Inbound::Led(data) => Some(data),
            Inbound::Ignored => {
                log::debug!("Ignoring unrecognised frame");
                None
            }
        }
    }

    /// The connection closed or errored; stop sending until the next ack.
    pub fn on_close(&mut self) {
        if self.state != ConnectionState::Disconnected {
            log::info!("Socket closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// One watchdog period elapsed.
    ///
    /// # Errors
    ///
    /// Only a failed reopen is reported; a failed probe is logged.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.misses += 1;
        if self.misses > self.miss_limit {
            log::warn!(
                "No heartbeat ack for {} ticks, reconnecting",
                self.misses - 1
            );
            self.misses = 0;
            self.transport.close();
            self.state = ConnectionState::Disconnected;
            self.reconnects += 1;
            self.connect()?;
            return Ok(TickOutcome::Reconnected);
        }

        if !self.is_alive() {
            return Ok(TickOutcome::Waiting);
        }
        if let Err(e) = self.transport.send_text(&Outbound::Probe.encode()) {
            log::warn!("Heartbeat probe failed: {e}");
        }
        Ok(TickOutcome::Probed)
    }

    /// Send key state if the connection is alive.
    ///
    /// Returns `Ok(false)` when the send was skipped because the session is
    /// not alive.
    pub fn send_keys(&mut self, flags: &FlagArray) -> Result<bool> {
        if !self.is_alive() {
            return Ok(false);
        }
        self.transport.send_text(&Outbound::Keys(*flags).encode())?;
        Ok(true)
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == ConnectionState::Alive
    }

    /// Ticks since the last ack.
    #[must_use]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Forced reconnects since start.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

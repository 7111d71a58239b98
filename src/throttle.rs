//! Rate limiter with trailing-call coalescing.
//!
//! [`Throttle`] is a pure state machine: it never reads a clock. The host
//! runs the call whenever [`Throttle::call`] or
//! [`Throttle::cooldown_elapsed`] hands back arguments, and arms a one-shot
//! timer of [`Throttle::interval`] each time it does so. When that timer
//! fires the host calls [`Throttle::cooldown_elapsed`].
//!
//! ```text
//! call(a) ──► run a, arm timer
//! call(b) ──► pending = b
//! call(c) ──► pending = c          (b is dropped)
//! timer   ──► run c, arm timer     (trailing call starts a new window)
//! timer   ──► idle
//! ```

use std::time::Duration;

/// Fires at most once per interval, remembering only the latest pending call.
#[derive(Debug)]
pub struct Throttle<A> {
    interval: Duration,
    cooling_down: bool,
    pending: Option<A>,
}

impl<A> Throttle<A> {
    /// Create an idle throttle.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cooling_down: false,
            pending: None,
        }
    }

    /// Cooldown length the host timer must be armed with.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a cooldown timer is currently outstanding.
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    /// Whether a trailing call is waiting for the cooldown to end.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a call.
    ///
    /// Returns `Some(args)` when the call must run now; the caller then arms
    /// the cooldown timer. Returns `None` when the call was parked as the
    /// pending trailing call, replacing any earlier one.
    pub fn call(&mut self, args: A) -> Option<A> {
        if self.cooling_down {
            self.pending = Some(args);
            return None;
        }
        self.cooling_down = true;
        Some(args)
    }

    /// Signal that the cooldown timer fired.
    ///
    /// Returns the pending call if there is one; it must run now and the
    /// timer must be re-armed. Otherwise the throttle goes idle.
    pub fn cooldown_elapsed(&mut self) -> Option<A> {
        self.cooling_down = false;
        let pending = self.pending.take()?;
        self.call(pending)
    }

    /// Drop any pending call and return to idle.
    pub fn reset(&mut self) {
        self.cooling_down = false;
        self.pending = None;
    }
}

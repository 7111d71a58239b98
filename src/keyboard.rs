//! The keyboard controller.
//!
//! [`Keyboard`] is the single owner of all mutable front-end state: the
//! compiled layout, the previous flag array, the send throttle, the socket
//! session and the LED raster. The host driver routes every DOM, socket and
//! timer event through it and applies whatever it hands back.
//!
//! # Touch pass
//!
//! ```text
//! points ─► encode ─► diff vs previous ─► render ─► change check ─► throttle ─► send
//! ```
//!
//! Toggles are rendered before the send is attempted, so `previous` always
//! tracks what the page shows, even when the send then fails. A failed send
//! drops only its payload; the throttle window it opened keeps running and
//! the host still owns the timer that ends it.

use crate::config::{KeyboardSettings, SendPolicy};
use crate::error::Result;
use crate::flags::{encode_touches, FlagArray, TouchPoint};
use crate::geometry::{KeyDescriptor, KeyLayout};
use crate::led::LedRaster;
use crate::protocol::Inbound;
use crate::session::{ConnectionState, SocketSession, TickOutcome, Transport};
use crate::throttle::Throttle;
use crate::visual::{diff_toggles, KeyToggle};

/// What happened to the outbound key state for one touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// Written to the socket.
    Sent,
    /// Would have been sent, but the session is not alive.
    Skipped,
    /// Parked as the throttle's trailing call.
    Deferred,
    /// Flags equal the previous event's and the policy is on-change.
    Unchanged,
}

/// Result of one touch pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchOutcome<E> {
    pub flags: FlagArray,
    /// Elements whose pressed state changed; already passed to the renderer.
    pub toggles: Vec<KeyToggle<E>>,
    pub send: SendStatus,
    /// The send throttle started a cooldown; the host must call
    /// [`Keyboard::send_cooldown_elapsed`] after [`Keyboard::send_interval`].
    pub arm_send_timer: bool,
}

/// Front-end state for one page and one connection.
#[derive(Debug)]
pub struct Keyboard<E, T> {
    layout: KeyLayout<E>,
    previous: FlagArray,
    send_throttle: Throttle<FlagArray>,
    send_policy: SendPolicy,
    session: SocketSession<T>,
    led: LedRaster,
}

impl<E: Clone, T: Transport> Keyboard<E, T> {
    pub fn new(transport: T, settings: KeyboardSettings) -> Self {
        Self {
            layout: KeyLayout::default(),
            previous: FlagArray::default(),
            send_throttle: Throttle::new(settings.send_interval),
            send_policy: settings.send_policy,
            session: SocketSession::new(transport, settings.heartbeat_miss_limit),
            led: LedRaster::new(),
        }
    }

    /// Replace the layout with freshly measured keys.
    ///
    /// On error the previous layout stays in place.
    pub fn compile<I>(&mut self, descriptors: I) -> Result<()>
    where
        I: IntoIterator<Item = KeyDescriptor<E>>,
    {
        self.layout = KeyLayout::compile(descriptors)?;
        Ok(())
    }

    /// Run one touch pass over the currently active touch points.
    ///
    /// `render` is called once per changed key before anything is sent.
    ///
    /// # Errors
    ///
    /// A failed send. The pass is otherwise committed and a send cooldown
    /// has started, so the host must still arm the send timer.
    pub fn handle_touches<F>(
        &mut self,
        points: &[TouchPoint],
        mut render: F,
    ) -> Result<TouchOutcome<E>>
    where
        F: FnMut(&KeyToggle<E>),
    {
        let flags = encode_touches(&self.layout, points);
        let toggles = diff_toggles(&self.layout, &self.previous, &flags);
        toggles.iter().for_each(&mut render);

        let should_send = match self.send_policy {
            SendPolicy::Always => true,
            SendPolicy::OnChange => flags != self.previous,
        };

        let offered = if should_send {
            self.offer_send(flags)
        } else {
            Ok((SendStatus::Unchanged, false))
        };
        self.previous = flags;

        let (send, arm_send_timer) = offered?;
        Ok(TouchOutcome {
            flags,
            toggles,
            send,
            arm_send_timer,
        })
    }

    fn offer_send(&mut self, flags: FlagArray) -> Result<(SendStatus, bool)> {
        let Some(flags) = self.send_throttle.call(flags) else {
            return Ok((SendStatus::Deferred, false));
        };
        if self.session.send_keys(&flags)? {
            Ok((SendStatus::Sent, true))
        } else {
            Ok((SendStatus::Skipped, true))
        }
    }

    /// The send cooldown elapsed. Returns `true` when a trailing send ran
    /// and the timer must be armed again.
    ///
    /// # Errors
    ///
    /// The trailing send failed. Its cooldown has started all the same, so
    /// the host must re-arm the timer.
    pub fn send_cooldown_elapsed(&mut self) -> Result<bool> {
        let Some(flags) = self.send_throttle.cooldown_elapsed() else {
            return Ok(false);
        };
        self.session.send_keys(&flags)?;
        Ok(true)
    }

    /// A send cooldown is running and the host timer must end it.
    pub fn is_send_cooling_down(&self) -> bool {
        self.send_throttle.is_cooling_down()
    }

    pub fn send_interval(&self) -> std::time::Duration {
        self.send_throttle.interval()
    }

    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    pub fn on_open(&mut self) -> Result<()> {
        self.session.on_open()
    }

    pub fn on_text(&mut self, text: &str) {
        self.session.on_inbound(Inbound::from_text(text));
    }

    /// Decode a binary frame. Returns the raster when it changed.
    pub fn on_binary(&mut self, data: &[u8]) -> Option<&LedRaster> {
        let frame = self.session.on_inbound(Inbound::from_binary(data))?;
        self.led.apply(frame);
        Some(&self.led)
    }

    pub fn on_close(&mut self) {
        self.session.on_close();
    }

    /// Watchdog period elapsed.
    pub fn watchdog_tick(&mut self) -> Result<TickOutcome> {
        self.session.tick()
    }

    pub fn layout(&self) -> &KeyLayout<E> {
        &self.layout
    }

    pub fn flags(&self) -> FlagArray {
        self.previous
    }

    pub fn led(&self) -> &LedRaster {
        &self.led
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn session(&self) -> &SocketSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SocketSession<T> {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::geometry::tests::descriptor;
    use crate::session::tests::RecordingTransport;

    fn keyboard(policy: SendPolicy) -> Keyboard<&'static str, RecordingTransport> {
        let settings = KeyboardSettings {
            send_policy: policy,
            ..KeyboardSettings::default()
        };
        let mut keyboard = Keyboard::new(RecordingTransport::default(), settings);
        keyboard
            .compile(vec![
                descriptor("k0", 0.0, 100.0, "0"),
                descriptor("k1", 100.0, 100.0, "1"),
                descriptor("k2", 200.0, 100.0, "2"),
                descriptor("k3", 300.0, 100.0, "3"),
            ])
            .expect("compile");
        keyboard.connect().expect("connect");
        keyboard.on_open().expect("open");
        keyboard.on_text("alive");
        keyboard
    }

    fn sent(keyboard: &Keyboard<&'static str, RecordingTransport>) -> Vec<String> {
        keyboard
            .session()
            .transport()
            .sent
            .iter()
            .filter(|s| s.starts_with('b'))
            .cloned()
            .collect()
    }

    #[test]
    fn test_touch_sends_and_toggles() {
        let mut kb = keyboard(SendPolicy::OnChange);
        let outcome = kb.handle_touches(&[TouchPoint::new(150.0, 50.0)], |_| {}).expect("touch");
        assert_eq!(outcome.flags, FlagArray::new([0, 1, 0, 0]));
        assert_eq!(outcome.toggles, vec![KeyToggle { element: "k1", active: true }]);
        assert_eq!(outcome.send, SendStatus::Sent);
        assert!(outcome.arm_send_timer);
        assert_eq!(sent(&kb), vec!["b0100"]);
    }

    #[test]
    fn test_render_sees_every_toggle() {
        let mut kb = keyboard(SendPolicy::OnChange);
        let mut rendered = Vec::new();
        let outcome = kb
            .handle_touches(
                &[TouchPoint::new(50.0, 50.0), TouchPoint::new(350.0, 50.0)],
                |toggle| rendered.push(toggle.clone()),
            )
            .expect("touch");
        assert_eq!(rendered, outcome.toggles);
        assert_eq!(rendered.len(), 2);
    }

    #[test]
    fn test_same_touches_twice_is_idempotent() {
        let mut kb = keyboard(SendPolicy::OnChange);
        let touches = [TouchPoint::new(50.0, 50.0), TouchPoint::new(250.0, 50.0)];
        let first = kb.handle_touches(&touches, |_| {}).expect("touch");
        kb.send_cooldown_elapsed().expect("cooldown");
        let second = kb.handle_touches(&touches, |_| {}).expect("touch");
        assert_eq!(first.flags, second.flags);
        assert!(second.toggles.is_empty());
        assert_eq!(second.send, SendStatus::Unchanged);
        assert_eq!(sent(&kb), vec!["b1010"]);
    }

    #[test]
    fn test_always_policy_resends_identical_state() {
        let mut kb = keyboard(SendPolicy::Always);
        let touches = [TouchPoint::new(50.0, 50.0)];
        kb.handle_touches(&touches, |_| {}).expect("touch");
        assert!(!kb.send_cooldown_elapsed().expect("cooldown"));
        let second = kb.handle_touches(&touches, |_| {}).expect("touch");
        assert_eq!(second.send, SendStatus::Sent);
        assert_eq!(sent(&kb), vec!["b1000", "b1000"]);
    }

    #[test]
    fn test_burst_is_coalesced_to_latest() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], |_| {}).expect("touch");
        let deferred = kb.handle_touches(&[TouchPoint::new(150.0, 50.0)], |_| {}).expect("touch");
        assert_eq!(deferred.send, SendStatus::Deferred);
        assert!(!deferred.arm_send_timer);
        kb.handle_touches(&[TouchPoint::new(350.0, 50.0)], |_| {}).expect("touch");

        assert!(kb.send_cooldown_elapsed().expect("cooldown"));
        assert!(!kb.send_cooldown_elapsed().expect("cooldown"));
        assert_eq!(sent(&kb), vec!["b1000", "b0001"]);
    }

    #[test]
    fn test_not_alive_skips_send() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.on_close();
        let outcome = kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], |_| {}).expect("touch");
        assert_eq!(outcome.send, SendStatus::Skipped);
        assert!(outcome.arm_send_timer);
        assert!(sent(&kb).is_empty());
    }

    #[test]
    fn test_failed_send_still_commits_rendered_state() {
        let mut kb = keyboard(SendPolicy::OnChange);
        let mut active: HashSet<&'static str> = HashSet::new();
        let mut render = |toggle: &KeyToggle<&'static str>| {
            if toggle.active {
                active.insert(toggle.element);
            } else {
                active.remove(toggle.element);
            }
        };

        kb.session_mut().transport_mut().fail_send = true;
        assert!(kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], &mut render).is_err());
        assert_eq!(kb.flags(), FlagArray::new([1, 0, 0, 0]));
        assert!(kb.is_send_cooling_down());

        kb.session_mut().transport_mut().fail_send = false;
        let release = kb.handle_touches(&[], &mut render).expect("release");
        assert_eq!(release.toggles, vec![KeyToggle { element: "k0", active: false }]);
        assert!(active.is_empty());
    }

    #[test]
    fn test_failed_send_keeps_throttle_window() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.session_mut().transport_mut().fail_send = true;
        assert!(kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], |_| {}).is_err());

        kb.session_mut().transport_mut().fail_send = false;
        let next = kb.handle_touches(&[TouchPoint::new(150.0, 50.0)], |_| {}).expect("touch");
        assert_eq!(next.send, SendStatus::Deferred);
        assert!(sent(&kb).is_empty());

        assert!(kb.send_cooldown_elapsed().expect("cooldown"));
        assert_eq!(sent(&kb), vec!["b0100"]);
    }

    #[test]
    fn test_failed_trailing_send_drops_only_payload() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], |_| {}).expect("touch");
        kb.handle_touches(&[TouchPoint::new(150.0, 50.0)], |_| {}).expect("touch");

        kb.session_mut().transport_mut().fail_send = true;
        assert!(kb.send_cooldown_elapsed().is_err());
        assert!(kb.is_send_cooling_down());

        kb.session_mut().transport_mut().fail_send = false;
        assert!(!kb.send_cooldown_elapsed().expect("cooldown"));
        assert!(!kb.is_send_cooling_down());
        assert_eq!(sent(&kb), vec!["b1000"]);
    }

    #[test]
    fn test_release_clears_keys() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.handle_touches(&[TouchPoint::new(50.0, 50.0)], |_| {}).expect("touch");
        kb.send_cooldown_elapsed().expect("cooldown");
        let outcome = kb.handle_touches(&[], |_| {}).expect("touch");
        assert_eq!(outcome.toggles, vec![KeyToggle { element: "k0", active: false }]);
        assert_eq!(sent(&kb), vec!["b1000", "b0000"]);
    }

    #[test]
    fn test_binary_frame_updates_led() {
        let mut kb = keyboard(SendPolicy::OnChange);
        let mut frame = [0u8; 96];
        frame[9..12].copy_from_slice(&[1, 2, 3]);
        let raster = kb.on_binary(&frame).expect("led frame");
        assert_eq!(raster.pixel(0), Some([2, 3, 1, 255]));
        assert!(kb.on_binary(&[]).is_none());
    }

    #[test]
    fn test_recompile_replaces_layout() {
        let mut kb = keyboard(SendPolicy::OnChange);
        kb.compile(vec![descriptor("wide", 0.0, 400.0, "2")]).expect("compile");
        assert_eq!(kb.layout().len(), 1);
        let outcome = kb.handle_touches(&[TouchPoint::new(350.0, 50.0)], |_| {}).expect("touch");
        assert_eq!(outcome.flags, FlagArray::new([0, 0, 1, 0]));
    }

    #[test]
    fn test_bad_recompile_keeps_old_layout() {
        let mut kb = keyboard(SendPolicy::OnChange);
        assert!(kb.compile(vec![descriptor("bad", 0.0, 10.0, "x")]).is_err());
        assert_eq!(kb.layout().len(), 4);
    }

    #[test]
    fn test_watchdog_reconnects_through_keyboard() {
        let mut kb = keyboard(SendPolicy::OnChange);
        for _ in 0..3 {
            kb.watchdog_tick().expect("tick");
        }
        assert_eq!(kb.watchdog_tick().expect("tick"), TickOutcome::Reconnected);
        assert_eq!(kb.connection_state(), ConnectionState::Connecting);
    }
}

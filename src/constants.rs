//! Protocol and timing constants for the touch keyboard.
//!
//! Centralizes the magic numbers shared by the core and the browser
//! driver. Runtime-tunable values here are only defaults; see
//! [`crate::config::KeyboardSettings`].

use std::time::Duration;

// ============================================================================
// Key layout
// ============================================================================

/// Number of slots in a [`crate::flags::FlagArray`], independent of key count.
pub const FLAG_COUNT: usize = 4;

/// Offset added to a key's flag index when it belongs to the layered (air) bank.
pub const LAYER_FLAG_OFFSET: usize = 32;

/// Class name carried by every key element.
pub const KEY_CLASS: &str = "key";

/// Key attribute holding the flag index.
pub const FLAG_ATTRIBUTE: &str = "data-kflag";

/// Key attribute marking the layered (air) bank when non-zero.
pub const LAYER_ATTRIBUTE: &str = "data-air";

/// Attribute toggled on a key element while it is pressed.
pub const ACTIVE_ATTRIBUTE: &str = "data-active";

// ============================================================================
// Wire protocol
// ============================================================================

/// Liveness probe sent on open and on every watchdog tick while alive.
pub const PROBE: &str = "alive?";

/// Liveness acknowledgment sent back by the device.
pub const ACK: &str = "alive";

/// Leading tag character of an outbound key-state frame.
pub const KEYS_TAG: char = 'b';

/// Path of the WebSocket endpoint on the page's host.
pub const SOCKET_PATH: &str = "/ws";

// ============================================================================
// LED strip
// ============================================================================

/// Minimum size of an inbound LED frame (32 LEDs, 3 bytes each).
pub const LED_FRAME_LEN: usize = 96;

/// LEDs decoded into the raster from the head of the frame.
pub const LED_DISPLAY_COUNT: usize = 4;

/// Width of the raster surface in pixels (four LEDs plus the echo pixel).
pub const LED_RASTER_WIDTH: usize = 5;

// ============================================================================
// Timing
// ============================================================================

/// Minimum spacing between outbound key-state sends.
pub const SEND_INTERVAL: Duration = Duration::from_millis(10);

/// Period of the heartbeat watchdog.
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);

/// Unacknowledged watchdog ticks tolerated before a forced reconnect.
pub const HEARTBEAT_MISS_LIMIT: u32 = 3;

/// Minimum spacing between fullscreen requests.
pub const FULLSCREEN_INTERVAL: Duration = Duration::from_millis(3000);

/// Screens taller than this are assumed to be desktops and never go fullscreen.
pub const FULLSCREEN_MAX_SCREEN_HEIGHT: i32 = 1024;

//! WebAssembly front-end for a multi-touch key controller.
//!
//! The page renders a keyboard layout; this crate maps the touches on it to
//! key-press flags, streams them to the device over a WebSocket, and paints
//! the device's LED strip from the binary frames it sends back.
//!
//! # Protocol Flow
//!
//! ```text
//! Browser (this crate)                        Device
//! ─────────────────────────────────────────────────────────
//! 1. Open ws://<host>/ws
//! 2. Send "alive?" ──────────────────────────►
//!                   ◄──────────────────────── 3. "alive"
//! 4. Touches → "b0100" (≤ 1 per 10ms) ───────►
//!                   ◄──────────────────────── 5. LED frame (96 bytes)
//! 6. Every 1s: "alive?"; after 3 unanswered ticks, reconnect
//! ```
//!
//! Everything except the browser driver is plain Rust and runs natively;
//! the driver (`run`) is only compiled for `wasm32`.

pub mod config;
pub mod constants;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod keyboard;
pub mod led;
pub mod protocol;
pub mod session;
pub mod throttle;
pub mod visual;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{Config, KeyboardSettings, SendPolicy};
pub use error::{Error, Result};
pub use flags::{encode_touches, FlagArray, TouchPoint};
pub use geometry::{BoundingBox, CompiledKey, KeyDescriptor, KeyLayout};
pub use keyboard::{Keyboard, SendStatus, TouchOutcome};
pub use led::LedRaster;
pub use protocol::{socket_url, Inbound, Outbound};
pub use session::{ConnectionState, SocketSession, TickOutcome, Transport};
pub use throttle::Throttle;
pub use visual::{diff_toggles, KeyToggle};

#[cfg(target_arch = "wasm32")]
pub use web::run;

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

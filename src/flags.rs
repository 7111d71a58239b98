//! Touch-to-flags encoding.
//!
//! Every touch event is re-encoded from scratch into a [`FlagArray`]: one
//! slot per logical key, `1` while pressed. Two touches that resolve to the
//! same flag index spill the second press into the next slot, which is how
//! layered key pairs report "both variants down".

use std::fmt;

use crate::constants::{FLAG_COUNT, KEYS_TAG};
use crate::geometry::KeyLayout;

/// A touch point in the same coordinate space as the compiled key boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fixed-width press state, index = flag index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagArray([u8; FLAG_COUNT]);

impl FlagArray {
    pub fn new(flags: [u8; FLAG_COUNT]) -> Self {
        Self(flags)
    }

    /// Value at `index`; anything outside the array reads as released.
    #[must_use]
    pub fn get(&self, index: usize) -> u8 {
        self.0.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.get(index) != 0
    }

    /// Mark `index` pressed, spilling into `index + 1` when already set.
    ///
    /// Returns the slot that was written, or `None` when the target slot lies
    /// outside the array. Out-of-range presses are dropped rather than
    /// written anywhere else.
    pub fn press(&mut self, index: usize) -> Option<usize> {
        let slot = if self.is_pressed(index) { index + 1 } else { index };
        match self.0.get_mut(slot) {
            Some(value) => {
                *value = 1;
                Some(slot)
            }
            None => {
                log::debug!("Dropping press for flag index {index}: slot {slot} out of range");
                None
            }
        }
    }

    /// Number of pressed slots.
    #[must_use]
    pub fn pressed_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0).count()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Outbound key-state frame: the tag character followed by every slot.
    ///
    /// `[0, 1, 0, 0]` encodes as `b0100`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FlagArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KEYS_TAG}")?;
        for value in self.0 {
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Encode the active touch list against the compiled layout.
///
/// Touches outside every key are skipped.
pub fn encode_touches<E>(layout: &KeyLayout<E>, points: &[TouchPoint]) -> FlagArray {
    let mut flags = FlagArray::default();
    for point in points {
        let Some(key) = layout.hit_test(point.x, point.y) else {
            continue;
        };
        flags.press(key.flag_index);
    }
    flags
}

//! Pressed-state diffing for key elements.
//!
//! Only keys whose flag actually changed produce a [`KeyToggle`], so the
//! host touches as few elements as possible per event.

use crate::flags::FlagArray;
use crate::geometry::KeyLayout;

/// Presentation change for one key element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyToggle<E> {
    pub element: E,
    /// `true` to mark the element active, `false` to clear it.
    pub active: bool,
}

/// Toggles for every compiled key whose flag differs between the two arrays.
///
/// Keys sharing a flag index each get their own toggle.
pub fn diff_toggles<E: Clone>(
    layout: &KeyLayout<E>,
    previous: &FlagArray,
    next: &FlagArray,
) -> Vec<KeyToggle<E>> {
    layout
        .keys()
        .iter()
        .filter(|key| previous.get(key.flag_index) != next.get(key.flag_index))
        .map(|key| KeyToggle {
            element: key.element.clone(),
            active: next.is_pressed(key.flag_index),
        })
        .collect()
}

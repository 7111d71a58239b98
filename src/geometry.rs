//! Key geometry compilation and hit-testing.
//!
//! The browser driver snapshots every key element into a
//! [`KeyDescriptor`]; [`KeyLayout::compile`] turns those into
//! [`CompiledKey`]s with a resolved flag index. The layout is rebuilt
//! wholesale on every resize and is never edited in place.

use crate::constants::{FLAG_ATTRIBUTE, FLAG_COUNT, LAYER_FLAG_OFFSET};
use crate::error::{Error, Result};

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl BoundingBox {
    /// Build a box from an origin and a size.
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
        }
    }

    /// Half-open containment: `left <= x < right` and `top <= y < bottom`.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.left <= x && x < self.right && self.top <= y && y < self.bottom
    }
}

/// Raw snapshot of one key element, as read from the page.
#[derive(Debug, Clone)]
pub struct KeyDescriptor<E> {
    pub bounds: BoundingBox,
    /// Text of the `data-kflag` attribute.
    pub flag: Option<String>,
    /// Text of the `data-air` attribute; a non-zero integer selects the layered bank.
    pub layer: Option<String>,
    pub element: E,
}

/// A key ready for hit-testing.
#[derive(Debug, Clone)]
pub struct CompiledKey<E> {
    pub bounds: BoundingBox,
    pub flag_index: usize,
    /// Back-reference to the host element, used only for rendering.
    pub element: E,
}

impl<E> CompiledKey<E> {
    /// Resolve a descriptor's attributes into a flag index.
    pub fn compile(descriptor: KeyDescriptor<E>) -> Result<Self> {
        let raw = descriptor.flag.unwrap_or_default();
        let base: usize = raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidKeyAttribute {
                attribute: FLAG_ATTRIBUTE,
                value: raw.clone(),
            })?;

        let layered = descriptor
            .layer
            .as_deref()
            .and_then(|text| text.trim().parse::<i64>().ok())
            .is_some_and(|value| value != 0);

        Ok(Self {
            bounds: descriptor.bounds,
            flag_index: if layered { base + LAYER_FLAG_OFFSET } else { base },
            element: descriptor.element,
        })
    }

    /// Whether presses on this key can land in the outbound flag array.
    #[must_use]
    pub fn fits_flag_array(&self) -> bool {
        self.flag_index < FLAG_COUNT
    }
}

/// Ordered set of compiled keys, in document order.
#[derive(Debug, Clone)]
pub struct KeyLayout<E> {
    keys: Vec<CompiledKey<E>>,
}

impl<E> Default for KeyLayout<E> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<E> KeyLayout<E> {
    /// Compile every descriptor, preserving input order.
    ///
    /// # Errors
    ///
    /// Fails on the first key whose flag attribute does not parse.
    pub fn compile<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = KeyDescriptor<E>>,
    {
        let keys = descriptors
            .into_iter()
            .map(CompiledKey::compile)
            .collect::<Result<Vec<_>>>()?;
        let unreachable = keys.iter().filter(|key| !key.fits_flag_array()).count();
        if unreachable > 0 {
            log::warn!("{unreachable} keys have flag indices beyond the {FLAG_COUNT} sent slots");
        }
        log::debug!("Compiled {} keys", keys.len());
        Ok(Self { keys })
    }

    /// First key whose box contains the point; earlier keys win on overlap.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&CompiledKey<E>> {
        self.keys.iter().find(|key| key.bounds.contains(x, y))
    }

    pub fn keys(&self) -> &[CompiledKey<E>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn descriptor(
        name: &'static str,
        left: f64,
        width: f64,
        flag: &str,
    ) -> KeyDescriptor<&'static str> {
        KeyDescriptor {
            bounds: BoundingBox::from_rect(left, 0.0, width, 100.0),
            flag: Some(flag.to_string()),
            layer: None,
            element: name,
        }
    }

    /// Four 100px-wide keys side by side, flags 0..4.
    pub(crate) fn four_key_layout() -> KeyLayout<&'static str> {
        KeyLayout::compile(vec![
            descriptor("k0", 0.0, 100.0, "0"),
            descriptor("k1", 100.0, 100.0, "1"),
            descriptor("k2", 200.0, 100.0, "2"),
            descriptor("k3", 300.0, 100.0, "3"),
        ])
        .expect("layout should compile")
    }

    #[test]
    fn test_contains_is_half_open() {
        let bounds = BoundingBox::from_rect(10.0, 20.0, 30.0, 40.0);
        assert!(bounds.contains(10.0, 20.0));
        assert!(bounds.contains(39.9, 59.9));
        assert!(!bounds.contains(40.0, 30.0));
        assert!(!bounds.contains(20.0, 60.0));
        assert!(!bounds.contains(9.9, 30.0));
    }

    #[test]
    fn test_compile_preserves_order() {
        let layout = four_key_layout();
        let names: Vec<_> = layout.keys().iter().map(|k| k.element).collect();
        assert_eq!(names, vec!["k0", "k1", "k2", "k3"]);
        assert_eq!(layout.keys()[2].flag_index, 2);
    }

    #[test]
    fn test_layer_attribute_adds_offset() {
        let mut desc = descriptor("air", 0.0, 10.0, "1");
        desc.layer = Some("1".to_string());
        let key = CompiledKey::compile(desc).expect("should compile");
        assert_eq!(key.flag_index, 33);
    }

    #[test]
    fn test_layered_key_does_not_fit_flag_array() {
        let mut desc = descriptor("air", 0.0, 10.0, "1");
        desc.layer = Some("1".to_string());
        let layout = KeyLayout::compile(vec![desc, descriptor("k3", 10.0, 10.0, "3")])
            .expect("compile");
        let fits: Vec<bool> = layout.keys().iter().map(CompiledKey::fits_flag_array).collect();
        assert_eq!(fits, vec![false, true]);
    }

    #[test]
    fn test_zero_or_garbage_layer_is_not_layered() {
        for layer in ["0", "", "yes"] {
            let mut desc = descriptor("k", 0.0, 10.0, "2");
            desc.layer = Some(layer.to_string());
            let key = CompiledKey::compile(desc).expect("should compile");
            assert_eq!(key.flag_index, 2, "layer {layer:?}");
        }
    }

    #[test]
    fn test_invalid_flag_is_error() {
        let desc = descriptor("k", 0.0, 10.0, "abc");
        let err = CompiledKey::compile(desc).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKeyAttribute { attribute: "data-kflag", ref value } if value == "abc"
        ));

        let mut missing = descriptor("k", 0.0, 10.0, "0");
        missing.flag = None;
        assert!(CompiledKey::compile(missing).is_err());
    }

    #[test]
    fn test_hit_test_inside_and_outside() {
        let layout = four_key_layout();
        assert_eq!(layout.hit_test(150.0, 50.0).map(|k| k.element), Some("k1"));
        assert_eq!(layout.hit_test(399.0, 99.0).map(|k| k.element), Some("k3"));
        assert!(layout.hit_test(400.0, 50.0).is_none());
        assert!(layout.hit_test(50.0, 100.0).is_none());
        assert!(layout.hit_test(-1.0, 50.0).is_none());
    }

    #[test]
    fn test_hit_test_shared_edge_goes_to_right_key() {
        let layout = four_key_layout();
        assert_eq!(layout.hit_test(100.0, 10.0).map(|k| k.element), Some("k1"));
    }

    #[test]
    fn test_hit_test_overlap_prefers_earlier_key() {
        let layout = KeyLayout::compile(vec![
            descriptor("first", 0.0, 200.0, "0"),
            descriptor("second", 100.0, 200.0, "1"),
        ])
        .expect("layout should compile");
        assert_eq!(layout.hit_test(150.0, 10.0).map(|k| k.element), Some("first"));
        assert_eq!(layout.hit_test(250.0, 10.0).map(|k| k.element), Some("second"));
    }

    #[test]
    fn test_empty_layout_hits_nothing() {
        let layout: KeyLayout<()> = KeyLayout::default();
        assert!(layout.is_empty());
        assert!(layout.hit_test(0.0, 0.0).is_none());
    }
}

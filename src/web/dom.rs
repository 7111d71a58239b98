//! DOM access: element lookup, key measurement, rendering.

use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlStyleElement,
    ImageData, TouchEvent,
};

use crate::constants::{ACTIVE_ATTRIBUTE, FLAG_ATTRIBUTE, KEY_CLASS, LAYER_ATTRIBUTE};
use crate::error::{Error, Result};
use crate::flags::TouchPoint;
use crate::geometry::{BoundingBox, KeyDescriptor};
use crate::led::LedRaster;
use crate::visual::KeyToggle;

/// Look up an element by id and cast it.
pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| Error::MissingElement(format!("#{id}")))?
        .dyn_into::<T>()
        .map_err(|_| Error::MissingElement(format!("#{id} has the wrong element type")))
}

/// Measure every key element, in document order.
pub fn key_descriptors(document: &Document) -> Vec<KeyDescriptor<HtmlElement>> {
    let collection = document.get_elements_by_class_name(KEY_CLASS);
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .filter_map(|element| element.dyn_into::<HtmlElement>().ok())
        .map(|element| {
            let rect = element.get_bounding_client_rect();
            KeyDescriptor {
                bounds: BoundingBox::from_rect(rect.left(), rect.top(), rect.width(), rect.height()),
                flag: element.get_attribute(FLAG_ATTRIBUTE),
                layer: element.get_attribute(LAYER_ATTRIBUTE),
                element,
            }
        })
        .collect()
}

/// Client coordinates of every touch still on the surface.
pub fn touch_points(event: &TouchEvent) -> Vec<TouchPoint> {
    let touches = event.touches();
    (0..touches.length())
        .filter_map(|i| touches.get(i))
        .map(|touch| TouchPoint::new(f64::from(touch.client_x()), f64::from(touch.client_y())))
        .collect()
}

/// Reflect a pressed-state change on the key element.
pub fn apply_toggle(toggle: &KeyToggle<HtmlElement>) {
    let result = if toggle.active {
        toggle.element.set_attribute(ACTIVE_ATTRIBUTE, "")
    } else {
        toggle.element.remove_attribute(ACTIVE_ATTRIBUTE)
    };
    if let Err(e) = result {
        log::warn!("Failed to toggle key element: {e:?}");
    }
}

/// Append a `<style>` element holding `css` to the document head.
pub fn inject_style(document: &Document, css: &str) -> Result<()> {
    let head = document
        .head()
        .ok_or_else(|| Error::MissingElement("<head>".to_string()))?;
    let style: HtmlStyleElement = document
        .create_element("style")?
        .dyn_into()
        .map_err(|_| Error::Js("created element is not a <style>".to_string()))?;
    style.set_text_content(Some(css));
    head.append_child(&style)?;
    Ok(())
}

/// The LED strip canvas.
#[derive(Debug, Clone)]
pub struct LedCanvas {
    ctx: CanvasRenderingContext2d,
}

impl LedCanvas {
    pub fn locate(document: &Document, id: &str) -> Result<Self> {
        let canvas: HtmlCanvasElement = get_element(document, id)?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| Error::MissingElement(format!("2d context for #{id}")))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::Js(format!("#{id} returned an unexpected 2d context")))?;
        Ok(Self { ctx })
    }

    /// Draw the raster at the canvas origin.
    pub fn paint(&self, raster: &LedRaster) -> Result<()> {
        let image =
            ImageData::new_with_u8_clamped_array_and_sh(Clamped(raster.as_bytes()), raster.width(), 1)?;
        self.ctx.put_image_data(&image, 0.0, 0.0)?;
        Ok(())
    }
}

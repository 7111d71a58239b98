//! LED strip readout.
//!
//! Inbound frames describe a 32-LED strip as 3-byte triplets stored
//! blue, red, green. The page only shows the first four LEDs, mirrored so
//! that LED 3 lands on the leftmost pixel, plus an echo of the strip's last
//! LED in a fifth pixel.
//!
//! ```text
//! frame:  [B0 R0 G0][B1 R1 G1][B2 R2 G2][B3 R3 G3] ... [B31 R31 G31]
//! raster: [ LED3 ][ LED2 ][ LED1 ][ LED0 ][ LED31 ]
//! ```

use crate::constants::{LED_DISPLAY_COUNT, LED_FRAME_LEN, LED_RASTER_WIDTH};

/// Bytes per raster pixel (RGBA).
const PIXEL_BYTES: usize = 4;

/// Bytes per LED in the inbound frame.
const TRIPLET_BYTES: usize = 3;

/// Persistent RGBA raster, `LED_RASTER_WIDTH` x 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedRaster {
    data: [u8; LED_RASTER_WIDTH * PIXEL_BYTES],
}

impl Default for LedRaster {
    fn default() -> Self {
        Self::new()
    }
}

impl LedRaster {
    /// Black, fully opaque raster. Alpha is never written again.
    pub fn new() -> Self {
        let mut data = [0u8; LED_RASTER_WIDTH * PIXEL_BYTES];
        for pixel in data.chunks_exact_mut(PIXEL_BYTES) {
            pixel[3] = 255;
        }
        Self { data }
    }

    /// Decode a frame into the raster, overwriting the colour channels only.
    ///
    /// Bytes missing from a short frame read as zero.
    pub fn apply(&mut self, frame: &[u8]) {
        if frame.len() < LED_FRAME_LEN {
            log::warn!(
                "Short LED frame: {} bytes (expected {LED_FRAME_LEN})",
                frame.len()
            );
        }
        let byte = |index: usize| frame.get(index).copied().unwrap_or(0);

        for pixel in 0..LED_DISPLAY_COUNT {
            let triplet = (LED_DISPLAY_COUNT - 1 - pixel) * TRIPLET_BYTES;
            self.set_rgb(pixel, byte(triplet + 1), byte(triplet + 2), byte(triplet));
        }

        let last = LED_FRAME_LEN - TRIPLET_BYTES;
        self.set_rgb(LED_DISPLAY_COUNT, byte(last + 1), byte(last + 2), byte(last));
    }

    fn set_rgb(&mut self, pixel: usize, r: u8, g: u8, b: u8) {
        let offset = pixel * PIXEL_BYTES;
        self.data[offset..offset + 3].copy_from_slice(&[r, g, b]);
    }

    /// RGBA of one pixel.
    #[must_use]
    pub fn pixel(&self, index: usize) -> Option<[u8; 4]> {
        let offset = index * PIXEL_BYTES;
        let bytes = self.data.get(offset..offset + PIXEL_BYTES)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Raw RGBA bytes, row-major, ready for `ImageData`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        LED_RASTER_WIDTH as u32
    }
}

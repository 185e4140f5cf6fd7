//! # Monochrome Bitmap Buffer
//!
//! Bit-packed 1bpp frame buffer shared by every animation source: the
//! procedural generator draws into it, the online cache decodes into it, and
//! the renderer blits it into the display's draw target.
//!
//! ## Memory Layout
//!
//! Row-major, MSB-first within each byte (bit 7 is the leftmost pixel of the
//! byte), `ceil(width / 8)` bytes per row — the native layout of SSD1306-class
//! page buffers and of `embedded_graphics::image::ImageRaw<BinaryColor>`,
//! so frames can be blitted without any per-pixel conversion.
//!
//! A 128x64 frame is exactly 1024 bytes. All allocation happens once in
//! [`MonoBitmap::new`]; drawing never grows the buffer.
//!
//! The type also implements [`DrawTarget`] so `embedded-graphics` primitives
//! (and the transition compositor) can draw straight into a frame.

use embedded_graphics::image::ImageRaw;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// Fixed-size monochrome bitmap with 1 bit per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MonoBitmap {
    /// Allocate an all-clear (black) bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            data: vec![0u8; (bytes_per_row * height) as usize],
        }
    }

    /// Wrap existing packed bytes. Returns `None` unless `data` is exactly
    /// `height * ceil(width / 8)` bytes — partially valid buffers are never
    /// constructed.
    pub fn from_packed(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width.div_ceil(8) * height) as usize;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Packed byte length for the given dimensions.
    pub fn packed_len(width: u32, height: u32) -> usize {
        (width.div_ceil(8) * height) as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reset every pixel to off.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Set or clear a pixel. Out-of-bounds coordinates are ignored, so
    /// drawing code can run shapes off the edge without clipping logic.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        let bit_mask = 0x80 >> (x % 8);
        if on {
            self.data[byte_index] |= bit_mask;
        } else {
            self.data[byte_index] &= !bit_mask;
        }
    }

    /// Pixel state; out-of-bounds reads as off.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        self.data[byte_index] & (0x80 >> (x % 8)) != 0
    }

    /// Number of lit pixels, used by tests and the ASCII preview.
    pub fn lit_pixels(&self) -> u32 {
        self.data.iter().map(|b| b.count_ones()).sum()
    }

    /// View as an `embedded-graphics` raw image for blitting into a display.
    pub fn as_image_raw(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(&self.data, self.width)
    }

    // -- Geometric primitives used by the procedural generator --

    /// Filled circle (midpoint distance test).
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32) {
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                let dx = x - cx;
                let dy = y - cy;
                if dx * dx + dy * dy <= radius * radius && x >= 0 && y >= 0 {
                    self.set_pixel(x as u32, y as u32, true);
                }
            }
        }
    }

    /// Filled rounded rectangle centered at (cx, cy).
    ///
    /// Corner rounding via an in-circle distance test: a pixel outside the
    /// straight edges on both axes is kept only when within `corner_radius`
    /// of the corner.
    pub fn fill_rounded_rect(&mut self, cx: i32, cy: i32, width: i32, height: i32, corner_radius: i32) {
        let (hw, hh) = (width / 2, height / 2);
        for y in cy - hh..=cy + hh {
            for x in cx - hw..=cx + hw {
                let dx = (x - cx).abs() - hw + corner_radius;
                let dy = (y - cy).abs() - hh + corner_radius;
                let in_body = dx <= 0 || dy <= 0;
                let in_corner = dx * dx + dy * dy <= corner_radius * corner_radius;
                if (in_body || in_corner) && x >= 0 && y >= 0 {
                    self.set_pixel(x as u32, y as u32, true);
                }
            }
        }
    }

    /// Line segment via Bresenham's algorithm.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            if x >= 0 && y >= 0 {
                self.set_pixel(x as u32, y as u32, true);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }
}

impl OriginDimensions for MonoBitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for MonoBitmap {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

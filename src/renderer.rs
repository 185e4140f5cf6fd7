//! # Frame Painting
//!
//! This module turns selected frames into pixels on whatever display the
//! caller owns. Everything is generic over
//! `DrawTarget<Color = BinaryColor>` — an SSD1306 page buffer, a simulator
//! window, or this crate's own [`MonoBitmap`] (useful in tests, which makes
//! every rendering path assertable without hardware).
//!
//! Three painting paths:
//!
//! - [`draw_frame`]: blit one bitmap frame, optionally offset
//! - [`draw_transition`]: composite an outgoing and incoming frame per the
//!   transition's progress — sliding for directional transitions, Bayer
//!   dither selection for fades
//! - [`draw_label`]: text fallback naming the condition, for static mode
//!   and displays with nothing else to show
//!
//! An ASCII preview is included for development on machines without a
//! panel, in the spirit of the hardware-less development mode of small
//! display projects.

use crate::bitmap::MonoBitmap;
use crate::transition::{fade_visible, Direction, Transition};
use crate::WeatherCode;
use embedded_graphics::image::Image;
use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

/// Blit a frame into the display at the given pixel offset.
pub fn draw_frame<D>(display: &mut D, frame: &MonoBitmap, offset: (i32, i32)) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let raw = frame.as_image_raw();
    Image::new(&raw, Point::new(offset.0, offset.1)).draw(display)
}

/// Composite two frames according to an in-flight transition.
///
/// Directional: the incoming frame slides in from its origin edge while the
/// outgoing frame slides out ahead of it. Fade: each pixel shows the
/// incoming frame once the Bayer threshold for its position is passed —
/// fully deterministic in `now_ms`.
pub fn draw_transition<D>(
    display: &mut D,
    outgoing: &MonoBitmap,
    incoming: &MonoBitmap,
    transition: &Transition,
    now_ms: u64,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match transition.direction() {
        Direction::Fade => {
            let progress = transition.progress(now_ms);
            let (width, height) = (incoming.width(), incoming.height());
            let pixels = (0..height).flat_map(|y| {
                (0..width).map(move |x| {
                    let on = if fade_visible(progress, x, y) {
                        incoming.pixel(x, y)
                    } else {
                        outgoing.pixel(x, y)
                    };
                    let color = if on { BinaryColor::On } else { BinaryColor::Off };
                    Pixel(Point::new(x as i32, y as i32), color)
                })
            });
            display.draw_iter(pixels)
        }
        direction => {
            let extent = match direction {
                Direction::LeftToRight | Direction::RightToLeft => incoming.width(),
                _ => incoming.height(),
            };
            let incoming_offset = transition.offset(extent, now_ms);
            // Outgoing frame leaves one full extent ahead of the incoming one
            let outgoing_offset = match direction {
                Direction::LeftToRight => (incoming_offset.0 + extent as i32, 0),
                Direction::RightToLeft => (incoming_offset.0 - extent as i32, 0),
                Direction::TopToBottom => (0, incoming_offset.1 + extent as i32),
                Direction::BottomToTop => (0, incoming_offset.1 - extent as i32),
                Direction::Fade => unreachable!(),
            };
            display.clear(BinaryColor::Off)?;
            draw_frame(display, outgoing, outgoing_offset)?;
            draw_frame(display, incoming, incoming_offset)
        }
    }
}

/// Text fallback: the condition label, roughly centered.
pub fn draw_label<D>(display: &mut D, code: WeatherCode) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let label = code.label();
    let size = display.bounding_box().size;
    let x = (size.width as i32 - label.len() as i32 * 6) / 2;
    let y = size.height as i32 / 2;
    Text::new(label, Point::new(x.max(0), y), style)
        .draw(display)
        .map(|_| ())
}

/// Render a frame as ASCII art for terminal development mode.
///
/// One character per pixel, `#` for lit, `.` for dark, rows separated by
/// newlines.
pub fn ascii_frame(frame: &MonoBitmap) -> String {
    let mut out = String::with_capacity(((frame.width() + 1) * frame.height()) as usize);
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            out.push(if frame.pixel(x, y) { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::Direction;

    fn checkerboard(width: u32, height: u32) -> MonoBitmap {
        let mut bmp = MonoBitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    bmp.set_pixel(x, y, true);
                }
            }
        }
        bmp
    }

    fn solid(width: u32, height: u32) -> MonoBitmap {
        let mut bmp = MonoBitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bmp.set_pixel(x, y, true);
            }
        }
        bmp
    }

    #[test]
    fn draw_frame_at_origin_reproduces_the_bitmap() {
        let frame = checkerboard(16, 8);
        let mut display = MonoBitmap::new(16, 8);
        draw_frame(&mut display, &frame, (0, 0)).unwrap();
        assert_eq!(display.data(), frame.data());
    }

    #[test]
    fn draw_frame_applies_offset() {
        let frame = solid(4, 4);
        let mut display = MonoBitmap::new(16, 8);
        draw_frame(&mut display, &frame, (8, 2)).unwrap();
        assert!(!display.pixel(7, 2), "left of the offset stays dark");
        assert!(display.pixel(8, 2));
        assert!(display.pixel(11, 5));
    }

    #[test]
    fn directional_transition_endpoints() {
        let outgoing = solid(16, 8);
        let incoming = checkerboard(16, 8);

        let mut transition = Transition::new();
        transition.begin(WeatherCode::Rain, Direction::RightToLeft, 1000, 0);

        // Progress 0: outgoing frame fills the screen
        let mut start = MonoBitmap::new(16, 8);
        draw_transition(&mut start, &outgoing, &incoming, &transition, 0).unwrap();
        assert_eq!(start.data(), outgoing.data());

        // Progress 1: incoming frame fills the screen
        let mut end = MonoBitmap::new(16, 8);
        draw_transition(&mut end, &outgoing, &incoming, &transition, 1000).unwrap();
        assert_eq!(end.data(), incoming.data());
    }

    #[test]
    fn fade_transition_endpoints_and_mixing() {
        let outgoing = solid(16, 8);
        let incoming = MonoBitmap::new(16, 8); // all dark

        let mut transition = Transition::new();
        transition.begin(WeatherCode::Snow, Direction::Fade, 1000, 0);

        let mut start = MonoBitmap::new(16, 8);
        draw_transition(&mut start, &outgoing, &incoming, &transition, 0).unwrap();
        assert_eq!(start.lit_pixels(), 16 * 8, "progress 0 shows outgoing only");

        let mut mid = MonoBitmap::new(16, 8);
        draw_transition(&mut mid, &outgoing, &incoming, &transition, 500).unwrap();
        let lit = mid.lit_pixels();
        assert!(lit > 0 && lit < 16 * 8, "midway mixes the two frames, lit={lit}");

        let mut end = MonoBitmap::new(16, 8);
        draw_transition(&mut end, &outgoing, &incoming, &transition, 1000).unwrap();
        assert_eq!(end.lit_pixels(), 0, "progress 1 shows incoming only");
    }

    #[test]
    fn fade_is_reproducible_at_an_instant() {
        let outgoing = solid(16, 8);
        let incoming = checkerboard(16, 8);
        let mut transition = Transition::new();
        transition.begin(WeatherCode::Snow, Direction::Fade, 1000, 0);

        let mut a = MonoBitmap::new(16, 8);
        let mut b = MonoBitmap::new(16, 8);
        draw_transition(&mut a, &outgoing, &incoming, &transition, 430).unwrap();
        draw_transition(&mut b, &outgoing, &incoming, &transition, 430).unwrap();
        assert_eq!(a.data(), b.data(), "same instant must render identically");
    }

    #[test]
    fn label_renders_some_text() {
        let mut display = MonoBitmap::new(128, 64);
        draw_label(&mut display, WeatherCode::Storm).unwrap();
        assert!(display.lit_pixels() > 0);
    }

    #[test]
    fn ascii_preview_has_one_row_per_line() {
        let frame = checkerboard(8, 3);
        let text = ascii_frame(&frame);
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("#.#.#.#.\n"));
    }
}

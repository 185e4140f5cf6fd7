//! # Procedural Fallback Animations
//!
//! This module synthesizes animation frames locally when no real source is
//! available: nothing embedded, nothing fetched, or the network is down. It
//! is the last line of the "always renderable" guarantee — pure geometry
//! over a fixed-size bitmap, no I/O, bounded allocation, and it cannot fail.
//!
//! ## Determinism
//!
//! `generate` is a pure function of `(code, width, height)`: the same inputs
//! always produce bit-identical frames. There is no randomness anywhere in
//! the pipeline, so rendered output is reproducible in tests and across
//! restarts.
//!
//! ## Frame Repertoire
//!
//! - **Clear**: filled sun disc; the second frame adds 8 rays at 45°
//!   increments, drawn from just outside the disc radius outward
//! - **Cloudy**: two overlapping rounded-rectangle clouds that swap
//!   horizontal offsets across frames, simulating drift
//! - **Rain**: one cloud plus a field of short diagonal streaks whose
//!   vertical offset advances by a fixed step over 3 frames
//! - **Snow**: one cloud plus asterisk marks falling the same way
//! - **Storm**: one wide cloud plus a zig-zag bolt drawn from line
//!   segments, alternating position across 2 frames
//!
//! All geometry scales with the requested dimensions, so the same code
//! serves a 128x64 OLED and larger panels.

use crate::bitmap::MonoBitmap;
use crate::{FrameSet, WeatherCode};

/// Generate the fallback frame set for a weather code at display size.
///
/// Deterministic and infallible; see the module docs for the per-code
/// frame repertoire.
pub fn generate(code: WeatherCode, width: u32, height: u32) -> FrameSet {
    match code {
        WeatherCode::Clear => clear_frames(width, height),
        WeatherCode::Cloudy => cloudy_frames(width, height),
        WeatherCode::Rain => precipitation_frames(width, height, Precipitation::Rain),
        WeatherCode::Snow => precipitation_frames(width, height, Precipitation::Snow),
        WeatherCode::Storm => storm_frames(width, height),
    }
}

fn clear_frames(width: u32, height: u32) -> FrameSet {
    let (w, h) = (width as i32, height as i32);
    let (cx, cy) = (w / 2, h / 2);
    let radius = (w.min(h) / 6).max(3);

    let mut disc = MonoBitmap::new(width, height);
    disc.fill_circle(cx, cy, radius);

    // Second frame: same disc plus 8 rays at 45 degree increments, each a
    // line from just outside the disc to radius + delta.
    let mut rays = disc.clone();
    let inner = radius + 2;
    let outer = radius + 2 + (radius * 2 / 3).max(2);
    for ray in 0..8 {
        let angle = ray as f32 * std::f32::consts::FRAC_PI_4;
        let (sin, cos) = angle.sin_cos();
        let x0 = cx + (cos * inner as f32) as i32;
        let y0 = cy + (sin * inner as f32) as i32;
        let x1 = cx + (cos * outer as f32) as i32;
        let y1 = cy + (sin * outer as f32) as i32;
        rays.draw_line(x0, y0, x1, y1);
    }

    FrameSet::new(vec![disc, rays], 400).expect("clear frames are uniform")
}

fn cloudy_frames(width: u32, height: u32) -> FrameSet {
    let (w, h) = (width as i32, height as i32);
    let cloud_w = (w * 3 / 10).max(8);
    let cloud_h = (h / 4).max(4);
    let corner = (cloud_h / 2).max(2);

    // Two clouds drifting against each other: the left one moves right, the
    // right one moves left on the alternate frame.
    let drift = (w / 24).max(2);
    let mut frames = Vec::with_capacity(2);
    for step in 0..2 {
        let offset = step * drift;
        let mut frame = MonoBitmap::new(width, height);
        frame.fill_rounded_rect(w / 4 + offset, h * 2 / 5, cloud_w, cloud_h, corner);
        frame.fill_rounded_rect(w * 2 / 3 - offset, h / 2, cloud_w + drift, cloud_h, corner);
        frames.push(frame);
    }

    FrameSet::new(frames, 400).expect("cloudy frames are uniform")
}

enum Precipitation {
    Rain,
    Snow,
}

fn precipitation_frames(width: u32, height: u32, kind: Precipitation) -> FrameSet {
    let (w, h) = (width as i32, height as i32);
    let cloud_w = (w * 2 / 5).max(10);
    let cloud_h = (h / 4).max(4);
    let corner = (cloud_h / 2).max(2);
    let cloud_y = h / 3;

    // Marks repeat across the width and fall by one fixed step per frame;
    // after 3 frames the pattern wraps, producing the falling illusion.
    let columns = 5;
    let spacing = w / (columns + 1);
    let fall_base = cloud_y + cloud_h;
    let fall_step = (h / 12).max(2);

    let (frame_count, delay) = match kind {
        Precipitation::Rain => (3, 200),
        Precipitation::Snow => (3, 250),
    };

    let mut frames = Vec::with_capacity(frame_count);
    for step in 0..frame_count as i32 {
        let mut frame = MonoBitmap::new(width, height);
        frame.fill_rounded_rect(w / 2, cloud_y, cloud_w, cloud_h, corner);

        let y = fall_base + step * fall_step;
        for column in 1..=columns {
            let x = column * spacing;
            match kind {
                Precipitation::Rain => rain_streak(&mut frame, x, y),
                Precipitation::Snow => snow_mark(&mut frame, x, y),
            }
        }
        frames.push(frame);
    }

    FrameSet::new(frames, delay).expect("precipitation frames are uniform")
}

fn storm_frames(width: u32, height: u32) -> FrameSet {
    let (w, h) = (width as i32, height as i32);
    let cloud_w = (w / 2).max(12);
    let cloud_h = (h * 3 / 10).max(5);
    let corner = (cloud_h / 2).max(2);
    let cloud_y = h / 3;

    // Bolt alternates between two horizontal positions across the frames.
    let bolt_y = cloud_y + cloud_h / 2;
    let positions = [w / 2 - w / 10, w / 2 + w / 10];

    let mut frames = Vec::with_capacity(2);
    for &bolt_x in &positions {
        let mut frame = MonoBitmap::new(width, height);
        frame.fill_rounded_rect(w / 2, cloud_y, cloud_w, cloud_h, corner);
        lightning_bolt(&mut frame, bolt_x, bolt_y, h);
        frames.push(frame);
    }

    FrameSet::new(frames, 300).expect("storm frames are uniform")
}

/// Short diagonal streak for a falling raindrop.
fn rain_streak(frame: &mut MonoBitmap, x: i32, y: i32) {
    frame.draw_line(x, y, x - 2, y + 4);
}

/// Asterisk mark for a snowflake: horizontal, vertical, and both diagonals
/// within a radius-2 box.
fn snow_mark(frame: &mut MonoBitmap, x: i32, y: i32) {
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            if dx == 0 || dy == 0 || dx.abs() == dy.abs() {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 {
                    frame.set_pixel(px as u32, py as u32, true);
                }
            }
        }
    }
}

/// Zig-zag bolt below the cloud, drawn as point-to-point line segments.
fn lightning_bolt(frame: &mut MonoBitmap, x: i32, y: i32, display_height: i32) {
    // Segment geometry from a 64-row reference, scaled to the display.
    let s = (display_height / 16).max(1);
    let points = [
        (x, y),
        (x - s, y + s),
        (x + s / 2, y + 2 * s),
        (x - s / 2, y + 3 * s),
        (x + s, y + 4 * s),
        (x, y + 5 * s),
    ];
    for pair in points.windows(2) {
        frame.draw_line(pair[0].0, pair[0].1, pair[1].0, pair[1].1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        for code in WeatherCode::ALL {
            let a = generate(code, 128, 64);
            let b = generate(code, 128, 64);
            assert_eq!(a.frame_count(), b.frame_count());
            for i in 0..a.frame_count() {
                assert_eq!(
                    a.frame(i).data(),
                    b.frame(i).data(),
                    "frames for {code:?} must be bit-identical between calls"
                );
            }
        }
    }

    #[test]
    fn every_code_produces_renderable_frames() {
        for code in WeatherCode::ALL {
            let set = generate(code, 128, 64);
            assert!(set.frame_count() >= 2, "{code:?} should animate");
            assert_eq!(set.width(), 128);
            assert_eq!(set.height(), 64);
            for i in 0..set.frame_count() {
                assert!(
                    set.frame(i).lit_pixels() > 0,
                    "{code:?} frame {i} must draw something"
                );
            }
        }
    }

    #[test]
    fn frames_share_exact_buffer_length() {
        // All frames in one set must match the display buffer size
        for code in WeatherCode::ALL {
            let set = generate(code, 128, 64);
            for i in 0..set.frame_count() {
                assert_eq!(set.frame(i).data().len(), 1024);
            }
        }
    }

    #[test]
    fn clear_second_frame_adds_rays() {
        let set = generate(WeatherCode::Clear, 128, 64);
        assert!(
            set.frame(1).lit_pixels() > set.frame(0).lit_pixels(),
            "ray frame must add pixels over the bare disc"
        );
    }

    #[test]
    fn precipitation_frames_differ_by_fall_offset() {
        for code in [WeatherCode::Rain, WeatherCode::Snow] {
            let set = generate(code, 128, 64);
            assert_eq!(set.frame_count(), 3);
            assert_ne!(
                set.frame(0).data(),
                set.frame(1).data(),
                "{code:?} frames must move between steps"
            );
        }
    }

    #[test]
    fn storm_bolt_alternates_position() {
        let set = generate(WeatherCode::Storm, 128, 64);
        assert_eq!(set.frame_count(), 2);
        assert_ne!(set.frame(0).data(), set.frame(1).data());
    }

    #[test]
    fn generation_scales_to_other_display_sizes() {
        let set = generate(WeatherCode::Rain, 64, 48);
        assert_eq!(set.width(), 64);
        assert_eq!(set.height(), 48);
        assert!(set.frame(0).lit_pixels() > 0);
    }
}

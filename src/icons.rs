//! # Icon Mapping Table and Embedded Glyphs
//!
//! The single authority for turning a provider condition string into a
//! renderable animation source. One fixed, ordered table maps
//! `(condition, day/night variant)` to:
//!
//! - the URL slug for online icon fetching,
//! - the canonical [`WeatherCode`] the condition collapses onto,
//! - default frame count and per-frame delay for that animation.
//!
//! [`find`] is a total function: exact condition+variant match, then a
//! variant-less entry for the condition, then any entry for the condition,
//! then the global `"cloudy"` default, then the first table entry. Rendering
//! can therefore never stall on a missing mapping.
//!
//! The module also carries the built-in 16x16 glyph bitmaps used by the
//! embedded animation mode: small constant patterns blitted (with integer
//! scaling) into display-sized frames, so the engine can animate with zero
//! network and zero procedural generation cost.

use crate::bitmap::MonoBitmap;
use crate::{DayPart, FrameSet, WeatherCode};

/// One row of the icon mapping table.
#[derive(Clone, Copy, Debug)]
pub struct IconEntry {
    /// Provider condition string (e.g. "partlycloudy").
    pub condition: &'static str,
    /// "day", "night", or "" for conditions without variants.
    pub variant: &'static str,
    /// URL slug appended to the configured icon base URL.
    pub slug: &'static str,
    /// Canonical code this condition renders as.
    pub code: WeatherCode,
    /// Default frame count for the online sequence form.
    pub frame_count: usize,
    /// Default delay between frames in milliseconds.
    pub frame_delay_ms: u32,
}

/// Fixed, ordered mapping from provider conditions to animation sources.
///
/// Order matters: keyword resolution scans this table front to back, and the
/// final fallback of [`find`] is the first row.
pub const ICON_TABLE: &[IconEntry] = &[
    IconEntry { condition: "clear-night", variant: "", slug: "clear-night", code: WeatherCode::Clear, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "cloudy", variant: "", slug: "cloudy", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "fog", variant: "", slug: "fog", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "hail", variant: "", slug: "hail", code: WeatherCode::Snow, frame_count: 3, frame_delay_ms: 200 },
    IconEntry { condition: "lightning", variant: "", slug: "thunderstorms", code: WeatherCode::Storm, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "lightning-rainy", variant: "", slug: "thunderstorms-rain", code: WeatherCode::Storm, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "partlycloudy", variant: "day", slug: "partly-cloudy-day", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "partlycloudy", variant: "night", slug: "partly-cloudy-night", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "pouring", variant: "", slug: "extreme-rain", code: WeatherCode::Rain, frame_count: 3, frame_delay_ms: 150 },
    IconEntry { condition: "rainy", variant: "", slug: "rain", code: WeatherCode::Rain, frame_count: 3, frame_delay_ms: 200 },
    IconEntry { condition: "snowy", variant: "", slug: "snow", code: WeatherCode::Snow, frame_count: 3, frame_delay_ms: 200 },
    IconEntry { condition: "snowy-rainy", variant: "", slug: "sleet", code: WeatherCode::Snow, frame_count: 3, frame_delay_ms: 200 },
    IconEntry { condition: "sunny", variant: "day", slug: "clear-day", code: WeatherCode::Clear, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "sunny", variant: "night", slug: "clear-night", code: WeatherCode::Clear, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "windy", variant: "", slug: "wind", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "windy-variant", variant: "", slug: "wind", code: WeatherCode::Cloudy, frame_count: 2, frame_delay_ms: 200 },
    IconEntry { condition: "exceptional", variant: "", slug: "not-available", code: WeatherCode::Cloudy, frame_count: 1, frame_delay_ms: 0 },
];

/// Look up the icon entry for a condition and time of day.
///
/// Precedence: exact condition+variant, then a variant-less entry for the
/// condition, then any entry for the condition, then `"cloudy"`, then the
/// first table row. Never fails.
pub fn find(condition: &str, is_day: bool) -> &'static IconEntry {
    let variant = if is_day { "day" } else { "night" };

    // Exact match with day/night variant; variant-less entries match any
    // time of day.
    for entry in ICON_TABLE {
        if entry.condition == condition {
            if entry.variant.is_empty() || entry.variant == variant {
                return entry;
            }
        }
    }

    // Any entry for the condition, variant ignored.
    for entry in ICON_TABLE {
        if entry.condition == condition {
            return entry;
        }
    }

    // Global default.
    for entry in ICON_TABLE {
        if entry.condition == "cloudy" {
            return entry;
        }
    }

    &ICON_TABLE[0]
}

/// Entry used for a bare weather code when no provider condition string is
/// available (manual overrides, engine defaults).
pub fn entry_for_code(code: WeatherCode, day: DayPart) -> &'static IconEntry {
    let condition = match (code, day) {
        (WeatherCode::Clear, DayPart::Day) => "sunny",
        (WeatherCode::Clear, DayPart::Night) => "clear-night",
        (WeatherCode::Cloudy, _) => "cloudy",
        (WeatherCode::Rain, _) => "rainy",
        (WeatherCode::Snow, _) => "snowy",
        (WeatherCode::Storm, _) => "lightning",
    };
    find(condition, day.is_day())
}

/// URL of one frame in a sequential source: `<base><NNN>.png`, zero-padded
/// 3-digit index.
pub fn frame_url(base_url: &str, index: usize) -> String {
    format!("{base_url}{index:03}.png")
}

/// URL of a single animated asset: `<base>.gif`.
pub fn animated_url(base_url: &str) -> String {
    format!("{base_url}.gif")
}

/// Base URL for an icon slug under the configured icon root.
pub fn source_base(icon_base: &str, slug: &str) -> String {
    format!("{icon_base}{slug}-")
}

// -- Built-in glyphs ---------------------------------------------------------
//
// 16x16 1bpp patterns, two bytes per row, MSB-first. Blitted with integer
// scaling into display-sized frames by `embedded_frames`.

const SUN_GLYPH: [u8; 32] = [
    0x00, 0x00, //
    0x01, 0x80, //        ##
    0x00, 0x00, //
    0x07, 0xE0, //      ######
    0x0F, 0xF0, //     ########
    0x1F, 0xF8, //    ##########
    0x1F, 0xF8, //    ##########
    0xDF, 0xFB, // ## ########## ##
    0xDF, 0xFB, // ## ########## ##
    0x1F, 0xF8, //    ##########
    0x1F, 0xF8, //    ##########
    0x0F, 0xF0, //     ########
    0x07, 0xE0, //      ######
    0x00, 0x00, //
    0x01, 0x80, //        ##
    0x00, 0x00, //
];

const CLOUD_GLYPH: [u8; 32] = [
    0x00, 0x00, //
    0x00, 0x00, //
    0x03, 0xC0, //       ####
    0x07, 0xE0, //      ######
    0x0F, 0xF0, //     ########
    0x3F, 0xFC, //   ############
    0x7F, 0xFE, //  ##############
    0x7F, 0xFE, //  ##############
    0x3F, 0xFC, //   ############
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
];

const RAIN_GLYPH: [u8; 32] = [
    0x00, 0x00, //
    0x03, 0xC0, //       ####
    0x07, 0xE0, //      ######
    0x1F, 0xF8, //    ##########
    0x3F, 0xFC, //   ############
    0x3F, 0xFC, //   ############
    0x1F, 0xF8, //    ##########
    0x00, 0x00, //
    0x24, 0x90, //   #  #  #  #
    0x12, 0x48, //    #  #  #  #
    0x00, 0x00, //
    0x24, 0x90, //   #  #  #  #
    0x12, 0x48, //    #  #  #  #
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
];

const SNOW_GLYPH: [u8; 32] = [
    0x00, 0x00, //
    0x03, 0xC0, //       ####
    0x07, 0xE0, //      ######
    0x1F, 0xF8, //    ##########
    0x3F, 0xFC, //   ############
    0x3F, 0xFC, //   ############
    0x1F, 0xF8, //    ##########
    0x00, 0x00, //
    0x24, 0x90, //   #  #  #  #
    0x00, 0x00, //
    0x49, 0x24, //  #  #  #  #  #
    0x00, 0x00, //
    0x24, 0x90, //   #  #  #  #
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
];

const STORM_GLYPH: [u8; 32] = [
    0x00, 0x00, //
    0x03, 0xC0, //       ####
    0x07, 0xE0, //      ######
    0x1F, 0xF8, //    ##########
    0x3F, 0xFC, //   ############
    0x3F, 0xFC, //   ############
    0x1F, 0xF8, //    ##########
    0x03, 0x00, //       ##
    0x06, 0x00, //      ##
    0x0F, 0x80, //     #####
    0x01, 0x80, //        ##
    0x03, 0x00, //       ##
    0x02, 0x00, //       #
    0x00, 0x00, //
    0x00, 0x00, //
    0x00, 0x00, //
];

fn glyph_for(code: WeatherCode) -> &'static [u8; 32] {
    match code {
        WeatherCode::Clear => &SUN_GLYPH,
        WeatherCode::Cloudy => &CLOUD_GLYPH,
        WeatherCode::Rain => &RAIN_GLYPH,
        WeatherCode::Snow => &SNOW_GLYPH,
        WeatherCode::Storm => &STORM_GLYPH,
    }
}

/// Blit a 16x16 glyph into a bitmap at integer scale.
fn blit_glyph(dst: &mut MonoBitmap, glyph: &[u8; 32], origin_x: i32, origin_y: i32, scale: u32) {
    for row in 0..16u32 {
        let bits = u16::from_be_bytes([glyph[(row * 2) as usize], glyph[(row * 2 + 1) as usize]]);
        for col in 0..16u32 {
            if bits & (0x8000 >> col) == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let x = origin_x + (col * scale + sx) as i32;
                    let y = origin_y + (row * scale + sy) as i32;
                    if x >= 0 && y >= 0 {
                        dst.set_pixel(x as u32, y as u32, true);
                    }
                }
            }
        }
    }
}

/// Build the built-in embedded frame set for a code at display size.
///
/// Deterministic: the glyph is centered and nudged by one scaled pixel per
/// frame — horizontally for sun/cloud drift, vertically for falling
/// rain/snow, and with an alternating bolt offset for storms.
pub fn embedded_frames(code: WeatherCode, width: u32, height: u32) -> FrameSet {
    let scale = (width.min(height) / 16).max(1);
    let glyph = glyph_for(code);
    let cx = (width as i32 - (16 * scale) as i32) / 2;
    let cy = (height as i32 - (16 * scale) as i32) / 2;
    let step = scale as i32;

    let (offsets, delay): (Vec<(i32, i32)>, u32) = match code {
        WeatherCode::Clear => (vec![(0, 0), (step, 0)], 400),
        WeatherCode::Cloudy => (vec![(0, 0), (step, 0)], 400),
        WeatherCode::Rain => (vec![(0, 0), (0, step), (0, 2 * step)], 200),
        WeatherCode::Snow => (vec![(0, 0), (0, step), (0, 2 * step)], 250),
        WeatherCode::Storm => (vec![(0, 0), (step, 0)], 300),
    };

    let frames = offsets
        .into_iter()
        .map(|(dx, dy)| {
            let mut frame = MonoBitmap::new(width, height);
            blit_glyph(&mut frame, glyph, cx + dx, cy + dy, scale);
            frame
        })
        .collect();

    FrameSet::new(frames, delay).expect("embedded frames are non-empty and uniform")
}

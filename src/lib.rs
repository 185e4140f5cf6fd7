//! # Weather Animator Core Library
//!
//! This library drives weather-themed animations on small monochrome displays
//! (128x64 SSD1306-class OLED panels and similar) from a remote telemetry
//! provider. It is designed for memory-constrained, single-threaded targets.
//!
//! ## Design Philosophy
//!
//! ### Cooperative polling
//! There is no internal scheduler thread. One external driver loop calls
//! [`engine::WeatherAnimator::update`] at its own cadence; network fetches are
//! synchronous and stall that loop for the duration of the HTTP round trip.
//! The engine is deliberately **not** safe to drive from multiple threads
//! without external synchronization.
//!
//! ### Always renderable
//! Every failure mode degrades to something drawable. If the provider is
//! unreachable the last known weather is kept; if no animation source is
//! loaded the procedural fallback generator synthesizes frames locally.
//! Nothing in the update path is fatal.
//!
//! ### Memory discipline
//! - **Fixed-size frames**: every frame is a bit-packed 1bpp buffer of
//!   exactly `height * ceil(width / 8)` bytes, matching the display
//! - **Single ownership**: fetched bytes and decoded frames are owned by
//!   exactly one cache slot; reassigning a slot drops the old cache once
//! - **In-memory only**: no caches survive a process restart
//!
//! ## Data Flow
//! 1. **Poll**: the driver loop calls `update()` every tick
//! 2. **Fetch**: if the cooldown has elapsed, query the telemetry provider
//! 3. **Resolve**: map the payload to a canonical [`WeatherCode`] + [`DayPart`]
//! 4. **Source**: revalidate the active animation source for that code
//! 5. **Render**: pick a frame by wall-clock time (or transition state) and
//!    paint it into the caller's draw target

use crate::bitmap::MonoBitmap;

// Module declarations
pub mod bitmap;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod icons;
pub mod renderer;
pub mod sources;
pub mod telemetry;
pub mod timing;
pub mod transition;

/// Canonical renderable weather category.
///
/// This is the closed set of conditions the engine can animate. Extended
/// provider condition strings (fog, hail, partly-cloudy, pouring, ...) map
/// onto this set through the icon mapping table in [`icons`], defaulting to
/// [`WeatherCode::Cloudy`] when unmapped.
///
/// Exactly one code is active at any time ("current weather").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherCode {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
}

impl WeatherCode {
    /// All codes in slot order. Source slots and caches are indexed by this.
    pub const ALL: [WeatherCode; 5] = [
        WeatherCode::Clear,
        WeatherCode::Cloudy,
        WeatherCode::Rain,
        WeatherCode::Snow,
        WeatherCode::Storm,
    ];

    /// Stable slot index for per-code storage.
    pub fn index(self) -> usize {
        match self {
            WeatherCode::Clear => 0,
            WeatherCode::Cloudy => 1,
            WeatherCode::Rain => 2,
            WeatherCode::Snow => 3,
            WeatherCode::Storm => 4,
        }
    }

    /// Short human-readable label, used by the text fallback renderer.
    pub fn label(self) -> &'static str {
        match self {
            WeatherCode::Clear => "Clear Sky",
            WeatherCode::Cloudy => "Cloudy",
            WeatherCode::Rain => "Rainy",
            WeatherCode::Snow => "Snowy",
            WeatherCode::Storm => "Stormy",
        }
    }
}

/// Day/night flag affecting icon variant selection.
///
/// Derived from the telemetry payload when it carries an `is_daytime` field,
/// otherwise from a local-hour heuristic (hour in `[6, 18)` means day).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayPart {
    Day,
    Night,
}

impl DayPart {
    /// Local-hour heuristic used when the payload has no day/night field.
    pub fn from_hour(hour: u32) -> Self {
        if (6..18).contains(&hour) {
            DayPart::Day
        } else {
            DayPart::Night
        }
    }

    /// Variant string used by the icon mapping table ("day" / "night").
    pub fn variant_str(self) -> &'static str {
        match self {
            DayPart::Day => "day",
            DayPart::Night => "night",
        }
    }

    pub fn is_day(self) -> bool {
        matches!(self, DayPart::Day)
    }
}

/// Ordered, non-empty sequence of fixed-size bitmap frames plus a per-frame
/// delay.
///
/// Invariant: all frames share identical dimensions (and therefore identical
/// byte length). The constructor enforces this; a `FrameSet` that exists is
/// always renderable.
///
/// # Example
/// ```
/// use weather_animator_lib::bitmap::MonoBitmap;
/// use weather_animator_lib::FrameSet;
///
/// let frames = vec![MonoBitmap::new(128, 64), MonoBitmap::new(128, 64)];
/// let set = FrameSet::new(frames, 200).unwrap();
/// assert_eq!(set.frame_count(), 2);
/// assert_eq!(set.frame_delay_ms(), 200);
/// ```
#[derive(Clone, Debug)]
pub struct FrameSet {
    frames: Vec<MonoBitmap>,
    frame_delay_ms: u32,
}

impl FrameSet {
    /// Build a frame set, validating the non-empty / uniform-size invariant.
    ///
    /// Returns `None` for an empty sequence or mismatched frame dimensions.
    pub fn new(frames: Vec<MonoBitmap>, frame_delay_ms: u32) -> Option<Self> {
        let first = frames.first()?;
        let (w, h) = (first.width(), first.height());
        if frames.iter().any(|f| f.width() != w || f.height() != h) {
            return None;
        }
        Some(Self {
            frames,
            frame_delay_ms,
        })
    }

    /// Single-frame set (static display, no animation).
    pub fn single(frame: MonoBitmap) -> Self {
        Self {
            frames: vec![frame],
            frame_delay_ms: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_delay_ms(&self) -> u32 {
        self.frame_delay_ms
    }

    /// Frame by index; wraps out-of-range indices so callers can never
    /// observe a missing frame.
    pub fn frame(&self, index: usize) -> &MonoBitmap {
        &self.frames[index % self.frames.len()]
    }

    pub fn width(&self) -> u32 {
        self.frames[0].width()
    }

    pub fn height(&self) -> u32 {
        self.frames[0].height()
    }

    /// Total heap bytes held by the frame buffers.
    pub fn byte_size(&self) -> usize {
        self.frames.iter().map(|f| f.data().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_set_rejects_empty_and_mismatched() {
        assert!(
            FrameSet::new(vec![], 100).is_none(),
            "empty frame list must be rejected"
        );

        let mismatched = vec![MonoBitmap::new(128, 64), MonoBitmap::new(64, 32)];
        assert!(
            FrameSet::new(mismatched, 100).is_none(),
            "frames of different sizes must be rejected"
        );
    }

    #[test]
    fn frame_lookup_wraps() {
        let set = FrameSet::new(vec![MonoBitmap::new(8, 8), MonoBitmap::new(8, 8)], 50).unwrap();
        // Index 5 wraps onto frame 1
        let _ = set.frame(5);
        assert_eq!(set.frame_count(), 2);
    }

    #[test]
    fn day_part_heuristic_boundaries() {
        assert_eq!(DayPart::from_hour(6), DayPart::Day);
        assert_eq!(DayPart::from_hour(17), DayPart::Day);
        assert_eq!(DayPart::from_hour(18), DayPart::Night);
        assert_eq!(DayPart::from_hour(5), DayPart::Night);
        assert_eq!(DayPart::from_hour(0), DayPart::Night);
    }

    #[test]
    fn weather_code_indices_are_stable() {
        for (i, code) in WeatherCode::ALL.iter().enumerate() {
            assert_eq!(code.index(), i, "slot order must match ALL order");
        }
    }
}

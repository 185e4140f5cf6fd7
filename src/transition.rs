//! # Screen Transition State Machine
//!
//! Timed visual effects bridging two displayed weather states. The machine
//! has exactly two states, `Idle` and `Transitioning`; a transition is
//! started explicitly, progresses as a pure function of the caller's clock,
//! and reports completion exactly once.
//!
//! ## Progress Model
//!
//! `progress = clamp((now - start) / duration, 0, 1)` — monotonically
//! non-decreasing in `now`, so a frame can never move backwards and a poll
//! loop of any cadence observes the same trajectory.
//!
//! Directional transitions slide the incoming frame along one axis:
//! `offset = extent * (1 - progress)`, signed per direction. The fade
//! transition reveals pixels through a 4x4 Bayer ordered-dither threshold of
//! `progress` — deterministic, so two renders at the same instant are
//! identical and tests can assert exact output.

use crate::WeatherCode;

/// Spatial (or fade) style of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
    Fade,
}

/// 4x4 Bayer ordered-dither matrix, thresholds 0..16.
const BAYER4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Whether a pixel of the incoming frame is visible at the given fade
/// progress. Deterministic in `(progress, x, y)`.
pub fn fade_visible(progress: f32, x: u32, y: u32) -> bool {
    let threshold = (BAYER4[(y % 4) as usize][(x % 4) as usize] as f32 + 0.5) / 16.0;
    progress >= threshold
}

/// Timed transition between weather displays.
///
/// Created idle; [`begin`](Transition::begin) arms it, [`poll`](Transition::poll)
/// advances it and fires the completion signal once.
#[derive(Clone, Debug)]
pub struct Transition {
    direction: Direction,
    target: WeatherCode,
    start_ms: u64,
    duration_ms: u32,
    active: bool,
}

impl Transition {
    pub fn new() -> Self {
        Self {
            direction: Direction::Fade,
            target: WeatherCode::Cloudy,
            start_ms: 0,
            duration_ms: 0,
            active: false,
        }
    }

    /// Arm a transition toward `target`. Ignored (returns false) while one
    /// is already running — restarting requires an explicit new call after
    /// completion.
    pub fn begin(
        &mut self,
        target: WeatherCode,
        direction: Direction,
        duration_ms: u32,
        now_ms: u64,
    ) -> bool {
        if self.active {
            return false;
        }
        self.direction = direction;
        self.target = target;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        self.active = true;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Code being transitioned to, while active.
    pub fn target(&self) -> Option<WeatherCode> {
        self.active.then_some(self.target)
    }

    /// Clamped progress in `[0, 1]`. An idle machine reads as complete.
    pub fn progress(&self, now_ms: u64) -> f32 {
        if !self.active {
            return 1.0;
        }
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f32;
        (elapsed / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Pixel offset of the incoming frame for directional transitions:
    /// `extent * (1 - progress)` along the relevant axis, signed so the
    /// frame slides in from the direction's origin edge. `Fade` has no
    /// offset.
    pub fn offset(&self, extent: u32, now_ms: u64) -> (i32, i32) {
        let remaining = (extent as f32 * (1.0 - self.progress(now_ms))) as i32;
        match self.direction {
            Direction::LeftToRight => (-remaining, 0),
            Direction::RightToLeft => (remaining, 0),
            Direction::TopToBottom => (0, -remaining),
            Direction::BottomToTop => (0, remaining),
            Direction::Fade => (0, 0),
        }
    }

    /// Advance the machine. Returns `true` exactly once, on the first poll
    /// where progress reaches 1; the machine is idle afterwards.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.active {
            return false;
        }
        if self.progress(now_ms) >= 1.0 {
            self.active = false;
            return true;
        }
        false
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_fires_exactly_once() {
        // Scenario: 1000 ms transition polled every 100 ms
        let mut transition = Transition::new();
        assert!(transition.begin(WeatherCode::Rain, Direction::RightToLeft, 1000, 0));

        for now in (100..1000).step_by(100) {
            assert!(!transition.poll(now), "not complete at {now} ms");
        }
        assert!(transition.poll(1000), "completes on the first poll at 1000 ms");
        assert!(!transition.poll(1100), "completion reported only once");
        assert!(!transition.is_active());
    }

    #[test]
    fn begin_is_ignored_while_active() {
        let mut transition = Transition::new();
        assert!(transition.begin(WeatherCode::Rain, Direction::Fade, 1000, 0));
        assert!(
            !transition.begin(WeatherCode::Snow, Direction::Fade, 1000, 100),
            "re-arm while running must be a no-op"
        );
        assert_eq!(transition.target(), Some(WeatherCode::Rain));

        assert!(transition.poll(1000));
        // After completion an explicit new begin starts a fresh transition
        assert!(transition.begin(WeatherCode::Snow, Direction::Fade, 500, 2000));
        assert_eq!(transition.target(), Some(WeatherCode::Snow));
    }

    #[test]
    fn progress_is_clamped_and_monotone() {
        let mut transition = Transition::new();
        transition.begin(WeatherCode::Cloudy, Direction::Fade, 1000, 500);

        assert_eq!(transition.progress(0), 0.0, "clock before start clamps to 0");
        assert_eq!(transition.progress(500), 0.0);
        assert!((transition.progress(1000) - 0.5).abs() < 1e-6);
        assert_eq!(transition.progress(1500), 1.0);
        assert_eq!(transition.progress(9999), 1.0, "clamped past the end");

        let mut last = 0.0f32;
        for now in (500..2000).step_by(37) {
            let p = transition.progress(now);
            assert!(p >= last, "progress must never decrease");
            last = p;
        }
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut transition = Transition::new();
        transition.begin(WeatherCode::Storm, Direction::TopToBottom, 0, 42);
        assert!(transition.poll(42), "zero duration is complete at once");
    }

    #[test]
    fn directional_offsets_shrink_to_zero() {
        let mut transition = Transition::new();
        transition.begin(WeatherCode::Rain, Direction::RightToLeft, 1000, 0);
        assert_eq!(transition.offset(128, 0), (128, 0), "full offset at start");
        assert_eq!(transition.offset(128, 500), (64, 0));
        assert_eq!(transition.offset(128, 1000), (0, 0), "settled at completion");

        let mut vertical = Transition::new();
        vertical.begin(WeatherCode::Rain, Direction::TopToBottom, 1000, 0);
        assert_eq!(vertical.offset(64, 0), (0, -64), "slides in from the top");

        let mut ltr = Transition::new();
        ltr.begin(WeatherCode::Rain, Direction::LeftToRight, 1000, 0);
        assert_eq!(ltr.offset(128, 0), (-128, 0), "slides in from the left");
    }

    #[test]
    fn fade_mask_is_deterministic_and_ordered() {
        // Same inputs, same answer
        for x in 0..8 {
            for y in 0..8 {
                assert_eq!(fade_visible(0.4, x, y), fade_visible(0.4, x, y));
            }
        }

        // Endpoints: nothing at 0, everything at 1
        let visible_at = |p: f32| {
            (0..4)
                .flat_map(|y| (0..4).map(move |x| (x, y)))
                .filter(|&(x, y)| fade_visible(p, x, y))
                .count()
        };
        assert_eq!(visible_at(0.0), 0);
        assert_eq!(visible_at(1.0), 16);

        // Coverage grows with progress
        assert!(visible_at(0.25) < visible_at(0.5));
        assert!(visible_at(0.5) < visible_at(0.75));
    }

    #[test]
    fn idle_machine_reads_complete_and_quiet() {
        let mut transition = Transition::new();
        assert!(!transition.poll(100), "idle poll never signals");
        assert_eq!(transition.progress(100), 1.0);
        assert_eq!(transition.target(), None);
    }
}

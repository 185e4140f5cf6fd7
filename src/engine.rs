//! # Weather Animation Engine
//!
//! The poll-driven coordinator that ties the crate together: cooldown-gated
//! telemetry fetches, condition resolution, animation source lifecycle,
//! frame scheduling, transitions, and painting — one `update()` call does
//! one tick of all of it.
//!
//! ## Control Flow Per Tick
//!
//! 1. Ask the cooldown whether a fetch is due; if so, record the attempt
//!    (win or lose) and query the provider
//! 2. On a successful fetch, resolve the observation; a changed weather
//!    code arms a transition and revalidates the new code's animation
//!    source
//! 3. Select the visible frame — from the transition compositor while one
//!    is running, otherwise from the pure time-based scheduler
//! 4. Paint into the caller's draw target
//!
//! ## Threading
//!
//! Single-threaded by design. The engine must be driven from one logical
//! thread; methods take `&mut self` and no internal synchronization exists.
//! Fetches block the calling loop. Wrap the engine in your own lock if you
//! must share it.
//!
//! ## Failure Policy
//!
//! Nothing in `update` is fatal and nothing panics: fetch errors keep the
//! last known weather, unloaded sources fall back to procedurally generated
//! frames, and the renderer always has something to paint.

use crate::bitmap::MonoBitmap;
use crate::config::{AnimationMode, Config};
use crate::sources::{AnimationSourceManager, FrameDecoder, OnlineKind, PackedBitmapDecoder};
use crate::telemetry::{self, HttpTransport};
use crate::timing::{frame_at, FetchCooldown};
use crate::transition::{Direction, Transition};
use crate::{fallback, icons, renderer, DayPart, FrameSet, WeatherCode};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use tracing::{debug, warn};

/// Weather-driven display animation engine.
///
/// Owns all mutable state of the animation pipeline. Not safe for
/// concurrent use; see the module docs.
pub struct WeatherAnimator {
    config: Config,
    sources: AnimationSourceManager,
    decoder: Box<dyn FrameDecoder>,
    cooldown: FetchCooldown,
    transition: Transition,
    /// Lazily generated fallback frames, one slot per code.
    fallback_cache: [Option<FrameSet>; 5],
    /// Online slug currently registered per code, to detect day/night
    /// variant changes that require re-registration.
    registered_slug: [Option<&'static str>; 5],
    code: WeatherCode,
    day: DayPart,
    /// Code the display is transitioning away from.
    transition_from: WeatherCode,
    last_observation: Option<telemetry::Observation>,
}

impl WeatherAnimator {
    /// Build an engine and install sources according to the configured
    /// animation mode: embedded frames for `Embedded`, their first frame
    /// only for `Static`, and icon-table URL registrations for `Online`.
    pub fn new(config: Config) -> Self {
        Self::with_decoder(config, Box::new(PackedBitmapDecoder))
    }

    /// Same as [`new`](Self::new) with a caller-supplied frame decoder
    /// (e.g. a real PNG/GIF codec).
    pub fn with_decoder(config: Config, decoder: Box<dyn FrameDecoder>) -> Self {
        let (width, height) = (config.display.width, config.display.height);
        let mut sources = AnimationSourceManager::new(width, height);
        let mut registered_slug = [None; 5];

        match config.animation.mode {
            AnimationMode::Embedded => {
                for code in WeatherCode::ALL {
                    sources.set_animation(code, icons::embedded_frames(code, width, height));
                }
            }
            AnimationMode::Static => {
                for code in WeatherCode::ALL {
                    let frames = icons::embedded_frames(code, width, height);
                    sources.set_animation(code, FrameSet::single(frames.frame(0).clone()));
                }
            }
            AnimationMode::Online => {
                for code in WeatherCode::ALL {
                    let entry = icons::entry_for_code(code, DayPart::Day);
                    sources.set_online_source(
                        code,
                        OnlineKind::FrameSequence {
                            base_url: icons::source_base(&config.animation.icon_base_url, entry.slug),
                            frame_count: entry.frame_count,
                        },
                        entry.frame_delay_ms,
                    );
                    registered_slug[code.index()] = Some(entry.slug);
                }
            }
        }

        let cooldown = FetchCooldown::new(config.animation.cooldown_ms);
        Self {
            config,
            sources,
            decoder,
            cooldown,
            transition: Transition::new(),
            fallback_cache: Default::default(),
            registered_slug,
            code: WeatherCode::Clear,
            day: DayPart::Day,
            transition_from: WeatherCode::Clear,
            last_observation: None,
        }
    }

    /// Current canonical weather pair.
    pub fn current_weather(&self) -> (WeatherCode, DayPart) {
        (self.code, self.day)
    }

    /// Most recent successfully resolved observation, if any.
    pub fn last_observation(&self) -> Option<&telemetry::Observation> {
        self.last_observation.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Install custom embedded frames for a code. Replaces any active
    /// source for that code; returns false for frames of the wrong size.
    pub fn set_animation(&mut self, code: WeatherCode, frames: FrameSet) -> bool {
        self.registered_slug[code.index()] = None;
        self.sources.set_animation(code, frames)
    }

    /// Register a custom online source for a code, dropping any prior
    /// cache exactly once.
    pub fn set_online_source(&mut self, code: WeatherCode, kind: OnlineKind, frame_delay_ms: u32) {
        self.registered_slug[code.index()] = None;
        self.sources.set_online_source(code, kind, frame_delay_ms);
    }

    /// Eagerly load every code's online source, ignoring the cooldown.
    /// Slots that fail stay unloaded and fall back at render time.
    pub fn preload<T: HttpTransport>(&mut self, transport: &mut T) {
        for code in WeatherCode::ALL {
            self.sources.ensure_loaded(code, transport, &*self.decoder);
        }
    }

    /// Manually set the current weather, arming the configured transition
    /// when the code changes. Mirrors a successful resolve without the
    /// network round trip.
    pub fn set_weather(&mut self, code: WeatherCode, day: DayPart, now_ms: u64) {
        if code != self.code {
            self.start_transition(code, now_ms);
        }
        self.code = code;
        self.day = day;
    }

    /// Explicitly run a transition to `code`. No-op while one is active.
    pub fn run_transition(
        &mut self,
        code: WeatherCode,
        direction: Direction,
        duration_ms: u32,
        now_ms: u64,
    ) -> bool {
        let from = self.code;
        if self.transition.begin(code, direction, duration_ms, now_ms) {
            self.transition_from = from;
            self.code = code;
            true
        } else {
            false
        }
    }

    /// One tick: fetch when due, then render the current frame or the
    /// in-flight transition into `display`.
    ///
    /// Returns `true` exactly once per transition, on the tick its
    /// progress reaches 1. Never fails: draw errors are the display's own
    /// error type and are returned to the caller, everything else is
    /// recovered internally.
    pub fn update<T, D>(
        &mut self,
        now_ms: u64,
        transport: &mut T,
        display: &mut D,
    ) -> Result<bool, D::Error>
    where
        T: HttpTransport,
        D: DrawTarget<Color = BinaryColor>,
    {
        if self.cooldown.due(now_ms) {
            // Attempt recorded regardless of outcome: a dead provider is
            // probed once per cooldown interval, not once per tick.
            self.cooldown.record_attempt(now_ms);
            match telemetry::fetch_observation(
                transport,
                &self.config.provider.base_url,
                &self.config.provider.entity_id,
                None,
            ) {
                Ok(observation) => self.apply_observation(observation, now_ms, transport),
                Err(err) => {
                    warn!("telemetry fetch failed, keeping last known weather: {err}");
                }
            }
        }

        self.render(now_ms, display)?;
        Ok(self.transition.poll(now_ms))
    }

    /// Fold a resolved observation into engine state: revalidate the
    /// animation source for the (possibly day/night-variant) condition and
    /// arm a transition when the code changed.
    fn apply_observation<T: HttpTransport>(
        &mut self,
        observation: telemetry::Observation,
        now_ms: u64,
        transport: &mut T,
    ) {
        let code = observation.code;

        if self.config.animation.mode == AnimationMode::Online {
            let entry = icons::find(observation.condition, observation.day.is_day());
            if self.registered_slug[code.index()] != Some(entry.slug) {
                debug!("re-registering {code:?} online source for slug {}", entry.slug);
                self.sources.set_online_source(
                    code,
                    OnlineKind::FrameSequence {
                        base_url: icons::source_base(
                            &self.config.animation.icon_base_url,
                            entry.slug,
                        ),
                        frame_count: entry.frame_count,
                    },
                    entry.frame_delay_ms,
                );
                self.registered_slug[code.index()] = Some(entry.slug);
            }
            self.sources.ensure_loaded(code, transport, &*self.decoder);
        }

        if code != self.code {
            debug!("weather changed {:?} -> {:?}", self.code, code);
            self.start_transition(code, now_ms);
        }
        self.code = code;
        self.day = observation.day;
        self.last_observation = Some(observation);
    }

    fn start_transition(&mut self, target: WeatherCode, now_ms: u64) {
        if let Some(direction) = self.config.animation.transition.direction() {
            let from = self.code;
            if self.transition.begin(
                target,
                direction,
                self.config.animation.transition_duration_ms,
                now_ms,
            ) {
                self.transition_from = from;
            }
        }
    }

    fn render<D>(&mut self, now_ms: u64, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        if self.transition.is_active() {
            let target = self.transition.target().unwrap_or(self.code);
            let outgoing = self.frame_bitmap(self.transition_from, now_ms);
            let incoming = self.frame_bitmap(target, now_ms);
            renderer::draw_transition(display, &outgoing, &incoming, &self.transition, now_ms)
        } else {
            display.clear(BinaryColor::Off)?;
            let frame = self.frame_bitmap(self.code, now_ms);
            renderer::draw_frame(display, &frame, (0, 0))
        }
    }

    /// The bitmap visible for `code` at `now_ms`: active source frames when
    /// available, otherwise the (lazily generated) procedural fallback.
    fn frame_bitmap(&mut self, code: WeatherCode, now_ms: u64) -> MonoBitmap {
        self.ensure_fallback(code);
        let set = self.sources.active_frame_set(code).unwrap_or_else(|| {
            self.fallback_cache[code.index()]
                .as_ref()
                .expect("fallback generated above")
        });
        let index = frame_at(now_ms, set.frame_delay_ms(), set.frame_count());
        set.frame(index).clone()
    }

    fn ensure_fallback(&mut self, code: WeatherCode) {
        let slot = &mut self.fallback_cache[code.index()];
        if slot.is_none() {
            *slot = Some(fallback::generate(
                code,
                self.sources.width(),
                self.sources.height(),
            ));
        }
    }
}

//! # Animation Source Management
//!
//! Owns, per [`WeatherCode`], the active animation source: an embedded frame
//! set installed synchronously, or an online source with an in-memory cache
//! of fetched bytes. This module is where all resource lifecycle rules live:
//!
//! - **Single ownership**: every fetched buffer and decoded frame belongs to
//!   exactly one cache slot. Replacing a slot's source drops the previous
//!   cache exactly once — move semantics make aliasing and double-free
//!   unrepresentable.
//! - **All-or-nothing loads**: a cache is never partially valid. `loaded`
//!   flips to true only after every asset of the source fetched and decoded;
//!   any failure leaves the slot empty and unloaded.
//! - **Single attempt**: [`AnimationSourceManager::ensure_loaded`] performs
//!   at most one fetch cycle per call and never retries internally. Retry
//!   policy belongs to the caller's cooldown.
//!
//! Decoding fetched bytes into frames is a collaborator concern behind
//! [`FrameDecoder`]. The default [`PackedBitmapDecoder`] accepts raw 1bpp
//! packed payloads of exactly the display's buffer size (or whole multiples
//! for animated assets) and rejects everything else; a real PNG/GIF codec
//! can be plugged in without touching cache lifecycle.

use crate::bitmap::MonoBitmap;
use crate::icons;
use crate::telemetry::{HttpTransport, TransportError};
use crate::{FrameSet, WeatherCode};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure modes of a single load attempt. All recovered by the caller:
/// an unloaded slot falls through to the procedural fallback.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("network unavailable: {0}")]
    Network(#[from] TransportError),

    #[error("HTTP status {0}")]
    Status(u16),

    /// Complete response with a zero-length body.
    #[error("empty response body")]
    Empty,

    /// Fetched bytes did not decode into frames of the display size.
    #[error("undecodable frame data")]
    Decode,
}

/// Shape of an online animation source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OnlineKind {
    /// Sequential still frames: `GET <base><NNN>.png` for each index.
    FrameSequence { base_url: String, frame_count: usize },
    /// One animated asset: `GET <url>` (a `.gif` in the reference provider).
    Animated { url: String },
}

/// In-memory cache for an online source.
///
/// Created empty; populated wholesale by a successful load; dropped whenever
/// a new source is assigned to the slot or the engine is torn down.
#[derive(Clone, Debug, Default)]
pub struct OnlineCache {
    raw: Vec<Vec<u8>>,
    bytes_total: usize,
    loaded: bool,
    frames: Option<FrameSet>,
}

impl OnlineCache {
    fn reset(&mut self) {
        self.raw.clear();
        self.raw.shrink_to_fit();
        self.bytes_total = 0;
        self.loaded = false;
        self.frames = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn bytes_total(&self) -> usize {
        self.bytes_total
    }
}

/// Online source: what to fetch plus the cache that owns the result.
#[derive(Clone, Debug)]
pub struct OnlineSource {
    pub kind: OnlineKind,
    pub frame_delay_ms: u32,
    cache: OnlineCache,
}

/// The active animation source bound to one weather code.
#[derive(Clone, Debug, Default)]
pub enum SourceSlot {
    /// Nothing registered; renderer falls back to procedural frames.
    #[default]
    Empty,
    /// RAM-resident frames, installed synchronously, always available.
    Embedded(FrameSet),
    /// Fetch-on-demand source with owned cache.
    Online(OnlineSource),
}

/// Decodes fetched bytes into display-sized frames.
///
/// Image codecs are outside this crate's contract; this seam is where a
/// real decoder plugs in.
pub trait FrameDecoder {
    /// Decode one still asset into a single frame.
    fn decode_frame(&self, bytes: &[u8], width: u32, height: u32) -> Option<MonoBitmap>;

    /// Decode one animated asset into a complete frame set.
    fn decode_animation(
        &self,
        bytes: &[u8],
        width: u32,
        height: u32,
        frame_delay_ms: u32,
    ) -> Option<FrameSet>;
}

/// Default decoder for raw bit-packed 1bpp payloads.
///
/// A still asset must be exactly `height * ceil(width/8)` bytes; an animated
/// asset a whole positive multiple of that. Anything else is rejected —
/// partially valid frames are never produced.
pub struct PackedBitmapDecoder;

impl FrameDecoder for PackedBitmapDecoder {
    fn decode_frame(&self, bytes: &[u8], width: u32, height: u32) -> Option<MonoBitmap> {
        MonoBitmap::from_packed(width, height, bytes.to_vec())
    }

    fn decode_animation(
        &self,
        bytes: &[u8],
        width: u32,
        height: u32,
        frame_delay_ms: u32,
    ) -> Option<FrameSet> {
        let frame_len = MonoBitmap::packed_len(width, height);
        if frame_len == 0 || bytes.is_empty() || bytes.len() % frame_len != 0 {
            return None;
        }
        let frames = bytes
            .chunks_exact(frame_len)
            .map(|chunk| MonoBitmap::from_packed(width, height, chunk.to_vec()))
            .collect::<Option<Vec<_>>>()?;
        FrameSet::new(frames, frame_delay_ms)
    }
}

/// Per-code animation sources and their caches.
pub struct AnimationSourceManager {
    slots: [SourceSlot; 5],
    width: u32,
    height: u32,
}

impl AnimationSourceManager {
    /// All slots start empty; frame dimensions are fixed to the display.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            slots: Default::default(),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Install an embedded frame set for a code, replacing (and dropping)
    /// whatever source was active before.
    ///
    /// Frame sets of the wrong dimensions are rejected so the slot can never
    /// hold frames that don't match the display.
    pub fn set_animation(&mut self, code: WeatherCode, frames: FrameSet) -> bool {
        if frames.width() != self.width || frames.height() != self.height {
            warn!(
                "rejecting {:?} frames sized {}x{} for a {}x{} display",
                code,
                frames.width(),
                frames.height(),
                self.width,
                self.height
            );
            return false;
        }
        self.slots[code.index()] = SourceSlot::Embedded(frames);
        true
    }

    /// Register an online source for a code with an empty cache.
    ///
    /// Any previously cached buffers for the slot are dropped here, exactly
    /// once, before the replacement is installed.
    pub fn set_online_source(&mut self, code: WeatherCode, kind: OnlineKind, frame_delay_ms: u32) {
        if let SourceSlot::Online(old) = &self.slots[code.index()] {
            if old.cache.loaded {
                debug!(
                    "dropping {} cached bytes for {:?} on source reassignment",
                    old.cache.bytes_total, code
                );
            }
        }
        self.slots[code.index()] = SourceSlot::Online(OnlineSource {
            kind,
            frame_delay_ms,
            cache: OnlineCache::default(),
        });
    }

    /// Clear a code's source entirely.
    pub fn clear(&mut self, code: WeatherCode) {
        self.slots[code.index()] = SourceSlot::Empty;
    }

    /// Drop every online cache, keeping source registrations.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            if let SourceSlot::Online(source) = slot {
                source.cache.reset();
            }
        }
    }

    /// True when the code can render without a fetch.
    pub fn is_loaded(&self, code: WeatherCode) -> bool {
        match &self.slots[code.index()] {
            SourceSlot::Empty => false,
            SourceSlot::Embedded(_) => true,
            SourceSlot::Online(source) => source.cache.loaded,
        }
    }

    /// Bytes currently cached for a code's online source.
    pub fn cached_bytes(&self, code: WeatherCode) -> usize {
        match &self.slots[code.index()] {
            SourceSlot::Online(source) => source.cache.bytes_total,
            _ => 0,
        }
    }

    /// Make the code's source renderable if it isn't already.
    ///
    /// Embedded sources are always ready. Online sources get **one** fetch
    /// cycle: every asset of the source is fetched and decoded, or the cache
    /// stays empty. No internal retry — the next call (or a source
    /// reassignment) is the only way to try again. Returns whether the slot
    /// is loaded afterwards.
    pub fn ensure_loaded<T: HttpTransport>(
        &mut self,
        code: WeatherCode,
        transport: &mut T,
        decoder: &dyn FrameDecoder,
    ) -> bool {
        let (width, height) = (self.width, self.height);
        let source = match &mut self.slots[code.index()] {
            SourceSlot::Empty => return false,
            SourceSlot::Embedded(_) => return true,
            SourceSlot::Online(source) => source,
        };
        if source.cache.loaded {
            return true;
        }

        match load_online(source, transport, decoder, width, height) {
            Ok(()) => {
                debug!(
                    "loaded {:?} online source ({} bytes, {} frames)",
                    code,
                    source.cache.bytes_total,
                    source.cache.frames.as_ref().map_or(0, FrameSet::frame_count)
                );
                true
            }
            Err(err) => {
                warn!("online source for {code:?} failed to load: {err}");
                source.cache.reset();
                false
            }
        }
    }

    /// The frames currently renderable for a code, if any.
    ///
    /// `None` means "use the procedural fallback" — never an error.
    pub fn active_frame_set(&self, code: WeatherCode) -> Option<&FrameSet> {
        match &self.slots[code.index()] {
            SourceSlot::Empty => None,
            SourceSlot::Embedded(frames) => Some(frames),
            SourceSlot::Online(source) => source.cache.frames.as_ref(),
        }
    }
}

/// One complete load attempt for an online source. On error the caller
/// resets the cache; on success the cache is fully populated.
fn load_online<T: HttpTransport>(
    source: &mut OnlineSource,
    transport: &mut T,
    decoder: &dyn FrameDecoder,
    width: u32,
    height: u32,
) -> Result<(), SourceError> {
    match &source.kind {
        OnlineKind::FrameSequence {
            base_url,
            frame_count,
        } => {
            let mut frames = Vec::with_capacity(*frame_count);
            for index in 0..*frame_count {
                let body = fetch_asset(transport, &icons::frame_url(base_url, index))?;
                let frame = decoder
                    .decode_frame(&body, width, height)
                    .ok_or(SourceError::Decode)?;
                source.cache.bytes_total += body.len();
                source.cache.raw.push(body);
                frames.push(frame);
            }
            source.cache.frames =
                Some(FrameSet::new(frames, source.frame_delay_ms).ok_or(SourceError::Decode)?);
        }
        OnlineKind::Animated { url } => {
            let body = fetch_asset(transport, url)?;
            let frames = decoder
                .decode_animation(&body, width, height, source.frame_delay_ms)
                .ok_or(SourceError::Decode)?;
            source.cache.bytes_total = body.len();
            source.cache.raw.push(body);
            source.cache.frames = Some(frames);
        }
    }
    source.cache.loaded = true;
    Ok(())
}

fn fetch_asset<T: HttpTransport>(transport: &mut T, url: &str) -> Result<Vec<u8>, SourceError> {
    let response = transport.get(url)?;
    if !(200..300).contains(&response.status) {
        return Err(SourceError::Status(response.status));
    }
    if response.body.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::HttpResponse;

    const W: u32 = 16;
    const H: u32 = 8;
    const FRAME_LEN: usize = 16; // 2 bytes per row * 8 rows

    /// Transport that serves the same canned response for every URL and
    /// counts how many requests were made.
    struct CannedTransport {
        response: Result<HttpResponse, TransportError>,
        hits: usize,
    }

    impl CannedTransport {
        fn ok(body: Vec<u8>) -> Self {
            Self {
                response: Ok(HttpResponse { status: 200, body }),
                hits: 0,
            }
        }

        fn status(status: u16) -> Self {
            Self {
                response: Ok(HttpResponse {
                    status,
                    body: vec![0xAA; FRAME_LEN],
                }),
                hits: 0,
            }
        }

        fn unreachable() -> Self {
            Self {
                response: Err(TransportError("connection refused".into())),
                hits: 0,
            }
        }
    }

    impl HttpTransport for CannedTransport {
        fn get(&mut self, _url: &str) -> Result<HttpResponse, TransportError> {
            self.hits += 1;
            match &self.response {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(TransportError(e.0.clone())),
            }
        }
    }

    fn sequence(count: usize) -> OnlineKind {
        OnlineKind::FrameSequence {
            base_url: "http://icons.example/rain-".into(),
            frame_count: count,
        }
    }

    #[test]
    fn embedded_source_is_always_loaded() {
        let mut manager = AnimationSourceManager::new(W, H);
        let frames = FrameSet::new(vec![MonoBitmap::new(W, H)], 100).unwrap();
        assert!(manager.set_animation(WeatherCode::Clear, frames));

        let mut transport = CannedTransport::unreachable();
        assert!(manager.ensure_loaded(WeatherCode::Clear, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 0, "embedded sources never touch the network");
        assert!(manager.active_frame_set(WeatherCode::Clear).is_some());
    }

    #[test]
    fn mismatched_embedded_frames_are_rejected() {
        let mut manager = AnimationSourceManager::new(W, H);
        let wrong = FrameSet::new(vec![MonoBitmap::new(32, 32)], 100).unwrap();
        assert!(!manager.set_animation(WeatherCode::Clear, wrong));
        assert!(manager.active_frame_set(WeatherCode::Clear).is_none());
    }

    #[test]
    fn successful_load_populates_cache_wholesale() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Rain, sequence(3), 200);
        assert!(!manager.is_loaded(WeatherCode::Rain));

        let mut transport = CannedTransport::ok(vec![0xFF; FRAME_LEN]);
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));

        assert_eq!(transport.hits, 3, "one GET per frame in the sequence");
        assert!(manager.is_loaded(WeatherCode::Rain));
        assert_eq!(manager.cached_bytes(WeatherCode::Rain), 3 * FRAME_LEN);

        let frames = manager.active_frame_set(WeatherCode::Rain).unwrap();
        assert_eq!(frames.frame_count(), 3);
        assert_eq!(frames.frame_delay_ms(), 200);
    }

    #[test]
    fn loaded_cache_short_circuits_the_network() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Rain, sequence(1), 200);

        let mut transport = CannedTransport::ok(vec![0xFF; FRAME_LEN]);
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 1, "second call must be served from cache");
    }

    #[test]
    fn http_error_leaves_cache_unloaded_without_retry() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Storm, sequence(2), 200);

        let mut transport = CannedTransport::status(404);
        assert!(!manager.ensure_loaded(WeatherCode::Storm, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 1, "sequence load aborts on the first failure");
        assert!(!manager.is_loaded(WeatherCode::Storm));
        assert_eq!(manager.cached_bytes(WeatherCode::Storm), 0);
        assert!(manager.active_frame_set(WeatherCode::Storm).is_none());
    }

    #[test]
    fn empty_body_is_a_load_failure() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Snow, sequence(1), 200);

        let mut transport = CannedTransport::ok(Vec::new());
        assert!(!manager.ensure_loaded(WeatherCode::Snow, &mut transport, &PackedBitmapDecoder));
        assert!(!manager.is_loaded(WeatherCode::Snow));
    }

    #[test]
    fn undecodable_bytes_are_a_load_failure() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Snow, sequence(1), 200);

        // Wrong length for a 16x8 packed frame
        let mut transport = CannedTransport::ok(vec![0xFF; FRAME_LEN + 1]);
        assert!(!manager.ensure_loaded(WeatherCode::Snow, &mut transport, &PackedBitmapDecoder));
        assert!(!manager.is_loaded(WeatherCode::Snow));
        assert_eq!(
            manager.cached_bytes(WeatherCode::Snow),
            0,
            "failed loads must not leave partial bytes behind"
        );
    }

    #[test]
    fn source_reassignment_drops_the_old_cache_once() {
        // Scenario: two consecutive registrations for the same code with
        // different URLs; the loaded cache from the first must be gone and
        // the slot must need a fresh fetch.
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Rain, sequence(2), 200);

        let mut transport = CannedTransport::ok(vec![0xFF; FRAME_LEN]);
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));
        assert_eq!(manager.cached_bytes(WeatherCode::Rain), 2 * FRAME_LEN);

        manager.set_online_source(
            WeatherCode::Rain,
            OnlineKind::FrameSequence {
                base_url: "http://icons.example/extreme-rain-".into(),
                frame_count: 2,
            },
            150,
        );
        assert!(!manager.is_loaded(WeatherCode::Rain), "loaded resets on reassignment");
        assert_eq!(manager.cached_bytes(WeatherCode::Rain), 0, "old bytes freed");

        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 4, "new source fetches from scratch");
    }

    #[test]
    fn animated_source_loads_from_a_single_asset() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(
            WeatherCode::Cloudy,
            OnlineKind::Animated {
                url: "http://icons.example/cloudy.gif".into(),
            },
            300,
        );

        // Two concatenated packed frames in one body
        let mut transport = CannedTransport::ok(vec![0x55; FRAME_LEN * 2]);
        assert!(manager.ensure_loaded(WeatherCode::Cloudy, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 1);

        let frames = manager.active_frame_set(WeatherCode::Cloudy).unwrap();
        assert_eq!(frames.frame_count(), 2);
    }

    #[test]
    fn invalidate_all_clears_caches_but_keeps_registrations() {
        let mut manager = AnimationSourceManager::new(W, H);
        manager.set_online_source(WeatherCode::Rain, sequence(1), 200);

        let mut transport = CannedTransport::ok(vec![0xFF; FRAME_LEN]);
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));

        manager.invalidate_all();
        assert!(!manager.is_loaded(WeatherCode::Rain));

        // Registration survives: a new ensure_loaded refetches
        assert!(manager.ensure_loaded(WeatherCode::Rain, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 2);
    }

    #[test]
    fn empty_slot_reports_unloaded_and_none() {
        let mut manager = AnimationSourceManager::new(W, H);
        let mut transport = CannedTransport::unreachable();
        assert!(!manager.ensure_loaded(WeatherCode::Clear, &mut transport, &PackedBitmapDecoder));
        assert_eq!(transport.hits, 0);
        assert!(manager.active_frame_set(WeatherCode::Clear).is_none());
    }
}

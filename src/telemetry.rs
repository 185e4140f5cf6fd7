//! # Telemetry Fetching and Condition Resolution
//!
//! This module handles the network side of weather state: fetching the
//! current entity state from a Home-Assistant-style provider and resolving
//! the payload into a canonical `(WeatherCode, DayPart)` pair.
//!
//! ## Data Source
//!
//! - **Endpoint**: `GET {base_url}/api/states/{entity_id}`
//! - **Auth**: bearer token header, attached by the transport
//! - **Body**: JSON with a `state` string and optional `attributes`
//!   (`is_daytime`, forecast temperature extremes)
//!
//! ## Resolution Pipeline
//!
//! 1. **Structured**: a `state` string known to the icon table wins
//! 2. **Keyword**: otherwise the raw payload text is scanned in a fixed
//!    precedence order (clear → cloudy → fog → hail → lightning → pouring →
//!    rain → snow → wind)
//! 3. **Default**: no match resolves to cloudy
//!
//! Resolution is a pure function of the payload plus an injectable local
//! time; malformed payloads degrade to defaults instead of erroring, so the
//! engine always ends the tick with a renderable condition.
//!
//! ## Transport Seam
//!
//! All HTTP goes through the [`HttpTransport`] trait — a blocking
//! `get(url) -> (status, bytes)` primitive. Production uses
//! [`ReqwestTransport`]; tests script a mock. The engine never retries
//! inside a call: one invocation, one attempt.

use crate::{icons, DayPart, WeatherCode};
use chrono::{DateTime, Local, Timelike};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by a telemetry fetch cycle.
///
/// All of these are recovered inside the engine: a failed fetch keeps the
/// last known weather and the renderer falls through to whatever frames are
/// available.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Transport-level failure (no connectivity, DNS, timeout).
    #[error("network unavailable: {0}")]
    Network(#[from] TransportError),

    /// Provider answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),
}

/// Opaque transport failure. Carried as a message so the trait stays
/// object-safe and implementation-agnostic.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Response from a blocking GET: status code plus the complete body.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Blocking HTTP collaborator.
///
/// The engine performs at most one `get` per fetch cycle and never retries
/// within a call; throttling lives in [`crate::timing::FetchCooldown`].
/// Implementations own any auth headers, timeouts, and TLS configuration.
pub trait HttpTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Production transport over a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    bearer: Option<String>,
}

impl ReqwestTransport {
    /// Build a transport; `bearer` is attached to every request when set.
    pub fn new(bearer: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client, bearer })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportError(e.to_string()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Raw provider payload, tolerant of missing or extra fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelemetryPayload {
    /// Condition string, e.g. "partlycloudy".
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub attributes: PayloadAttributes,
    /// Original body text, kept for keyword fallback when the structured
    /// fields are absent or unknown.
    #[serde(skip)]
    pub raw_text: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PayloadAttributes {
    #[serde(default)]
    pub is_daytime: Option<bool>,
    #[serde(default)]
    pub forecast_temp_min: Option<f64>,
    #[serde(default)]
    pub forecast_temp_max: Option<f64>,
}

impl TelemetryPayload {
    /// Parse a payload body. Never fails: unparseable JSON yields an empty
    /// structured payload whose raw text still feeds the keyword scan.
    pub fn from_json(body: &[u8]) -> Self {
        let raw_text = String::from_utf8_lossy(body).into_owned();
        let mut payload = match serde_json::from_slice::<TelemetryPayload>(body) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("payload not structured JSON, keyword scan only: {err}");
                TelemetryPayload::default()
            }
        };
        payload.raw_text = raw_text;
        payload
    }
}

/// Resolved weather observation: the canonical pair plus the provider
/// condition it came from and the forecast extremes when present.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub code: WeatherCode,
    pub day: DayPart,
    /// Table condition string the observation resolved through.
    pub condition: &'static str,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
}

/// Resolve a payload into an observation.
///
/// Pure over `(payload, now)`; `now` defaults to the local clock and only
/// matters when the payload carries no `is_daytime` field.
pub fn resolve(payload: &TelemetryPayload, now: Option<DateTime<Local>>) -> Observation {
    let day = match payload.attributes.is_daytime {
        Some(true) => DayPart::Day,
        Some(false) => DayPart::Night,
        None => {
            let hour = now.unwrap_or_else(Local::now).hour();
            DayPart::from_hour(hour)
        }
    };

    let condition = payload
        .state
        .as_deref()
        .filter(|s| icons::ICON_TABLE.iter().any(|e| e.condition == *s))
        .map(str::to_owned)
        .or_else(|| keyword_condition(&payload.raw_text).map(str::to_owned))
        .unwrap_or_else(|| "cloudy".to_owned());

    let entry = icons::find(&condition, day.is_day());

    Observation {
        code: entry.code,
        day,
        condition: entry.condition,
        temp_min: payload.attributes.forecast_temp_min,
        temp_max: payload.attributes.forecast_temp_max,
    }
}

/// Keyword scan over raw payload text, fixed precedence, first match wins.
fn keyword_condition(text: &str) -> Option<&'static str> {
    let text = text.to_ascii_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("clear") || has("sunny") {
        return Some("sunny");
    }
    if has("partly") {
        return Some("partlycloudy");
    }
    if has("cloud") || has("overcast") {
        return Some("cloudy");
    }
    if has("fog") || has("mist") || has("haze") {
        return Some("fog");
    }
    if has("hail") {
        return Some("hail");
    }
    if has("lightning") || has("thunder") || has("storm") {
        return Some(if has("rain") {
            "lightning-rainy"
        } else {
            "lightning"
        });
    }
    if has("pouring") {
        return Some("pouring");
    }
    if has("rain") || has("drizzle") {
        return Some("rainy");
    }
    if has("snow") || has("sleet") {
        return Some(if has("sleet") { "snowy-rainy" } else { "snowy" });
    }
    if has("wind") {
        return Some("windy");
    }
    if has("exceptional") {
        return Some("exceptional");
    }
    None
}

/// Fetch and resolve the current observation from the provider.
///
/// One blocking GET; non-success statuses are errors, but a successful
/// response always resolves (malformed bodies degrade to defaults).
pub fn fetch_observation<T: HttpTransport>(
    transport: &mut T,
    base_url: &str,
    entity_id: &str,
    now: Option<DateTime<Local>>,
) -> Result<Observation, TelemetryError> {
    let url = format!(
        "{}/api/states/{}",
        base_url.trim_end_matches('/'),
        entity_id
    );
    debug!("fetching telemetry from {url}");

    let response = transport.get(&url)?;
    if !(200..300).contains(&response.status) {
        warn!("telemetry fetch failed with status {}", response.status);
        return Err(TelemetryError::Status(response.status));
    }

    let payload = TelemetryPayload::from_json(&response.body);
    Ok(resolve(&payload, now))
}

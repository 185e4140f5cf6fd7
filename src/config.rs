//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! weather-config.toml file. It provides a centralized way to configure the
//! telemetry provider, display geometry, and animation behavior.
//!
//! Missing or invalid files fall back to defaults silently (with a log
//! line) — a display appliance should come up and render something rather
//! than refuse to start over a config typo.

use crate::transition::Direction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Application configuration loaded from weather-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Telemetry provider connection settings
    pub provider: ProviderConfig,
    /// Display geometry
    pub display: DisplayConfig,
    /// Animation sourcing and pacing
    pub animation: AnimationConfig,
}

/// Telemetry provider (Home-Assistant-style REST API) settings
#[derive(Debug, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Base URL, e.g. "http://homeassistant.local:8123"
    pub base_url: String,
    /// Long-lived access token sent as a bearer header; empty disables auth
    pub token: String,
    /// Weather entity to poll, e.g. "weather.forecast_home"
    pub entity_id: String,
}

/// Display geometry configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Display width in pixels
    pub width: u32,
    /// Display height in pixels
    pub height: u32,
}

/// Where animation frames come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Single still frame per condition, no animation
    Static,
    /// Built-in frames installed at startup, no network
    Embedded,
    /// Frames fetched from the icon provider, falling back to generated
    /// frames until loaded
    Online,
}

/// Transition style on weather changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionStyle {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
    Fade,
    /// Cut straight to the new condition
    None,
}

impl TransitionStyle {
    /// Engine direction for this style; `None` means no transition.
    pub fn direction(self) -> Option<Direction> {
        match self {
            TransitionStyle::LeftToRight => Some(Direction::LeftToRight),
            TransitionStyle::RightToLeft => Some(Direction::RightToLeft),
            TransitionStyle::TopToBottom => Some(Direction::TopToBottom),
            TransitionStyle::BottomToTop => Some(Direction::BottomToTop),
            TransitionStyle::Fade => Some(Direction::Fade),
            TransitionStyle::None => None,
        }
    }
}

/// Animation sourcing and pacing configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct AnimationConfig {
    /// Frame source mode
    pub mode: AnimationMode,
    /// Driver loop tick interval in milliseconds
    pub refresh_interval_ms: u64,
    /// Minimum interval between telemetry fetch attempts in milliseconds
    pub cooldown_ms: u64,
    /// Base URL for online icon assets
    pub icon_base_url: String,
    /// Transition rendered when the weather changes
    pub transition: TransitionStyle,
    /// Transition length in milliseconds
    pub transition_duration_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: ProviderConfig {
                base_url: "http://homeassistant.local:8123".to_string(),
                token: String::new(),
                entity_id: "weather.forecast_home".to_string(),
            },
            display: DisplayConfig {
                width: 128, // SSD1306 OLED
                height: 64,
            },
            animation: AnimationConfig {
                mode: AnimationMode::Embedded,
                refresh_interval_ms: 100,
                cooldown_ms: 300_000, // 5 minutes
                icon_base_url: "https://raw.githubusercontent.com/basmilius/weather-icons/master/production/fill/".to_string(),
                transition: TransitionStyle::Fade,
                transition_duration_ms: 800,
            },
        }
    }
}

impl Config {
    /// Load configuration from weather-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("weather-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("loaded configuration for entity: {}", config.provider.entity_id);
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {e}; using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to weather-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("weather-config.toml", contents)?;
        info!("configuration saved to weather-config.toml");
        Ok(())
    }
}

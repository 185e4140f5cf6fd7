//! # Weather Animator Application Entry Point
//!
//! This binary wires the animation engine to a real telemetry provider and
//! drives the poll loop. It supports a development mode (`--preview`) that
//! renders the procedural animation frames as ASCII and exits, useful for
//! checking output on machines without a display panel.

// Test modules
#[cfg(test)]
mod tests;

use std::env;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use weather_animator_lib::bitmap::MonoBitmap;
use weather_animator_lib::config::Config;
use weather_animator_lib::engine::WeatherAnimator;
use weather_animator_lib::renderer::ascii_frame;
use weather_animator_lib::telemetry::ReqwestTransport;
use weather_animator_lib::{fallback, WeatherCode};

/// Render every condition's procedural frames to stdout and exit.
///
/// Development mode: lets you eyeball the generated animations without a
/// panel or a provider.
fn preview(config: &Config) {
    let (width, height) = (config.display.width, config.display.height);
    for code in WeatherCode::ALL {
        let set = fallback::generate(code, width, height);
        println!("=== {} ({} frames) ===", code.label(), set.frame_count());
        for index in 0..set.frame_count() {
            println!("--- frame {index} ---");
            print!("{}", ascii_frame(set.frame(index)));
        }
    }
}

/// Production poll loop: fetch, animate, repeat.
///
/// The engine renders into an in-memory frame buffer; pushing that buffer
/// to a physical panel is the caller's concern (the buffer layout matches
/// SSD1306-class page memory byte for byte). On every weather change the
/// current frame is echoed to stdout for visibility.
fn run(config: Config) -> anyhow::Result<()> {
    let token = (!config.provider.token.is_empty()).then(|| config.provider.token.clone());
    let mut transport =
        ReqwestTransport::new(token).map_err(|e| anyhow::anyhow!("transport setup: {e}"))?;

    let (width, height) = (config.display.width, config.display.height);
    let tick = Duration::from_millis(config.animation.refresh_interval_ms.max(10));
    let mut engine = WeatherAnimator::new(config);
    let mut display = MonoBitmap::new(width, height);

    let start = Instant::now();
    let mut shown = engine.current_weather().0;

    loop {
        let now_ms = start.elapsed().as_millis() as u64;
        // The display buffer's draw error is Infallible
        let _completed = engine.update(now_ms, &mut transport, &mut display).unwrap_or(false);

        let (code, _) = engine.current_weather();
        if code != shown {
            shown = code;
            tracing::info!("now showing: {}", code.label());
            print!("{}", ascii_frame(&display));
        }

        std::thread::sleep(tick);
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Development mode: ASCII output for testing without hardware
    let preview_mode = env::args().any(|arg| arg == "--preview");

    let config = Config::load();

    if preview_mode {
        preview(&config);
        return Ok(());
    }

    run(config)
}

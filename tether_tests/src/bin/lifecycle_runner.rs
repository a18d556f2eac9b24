//! Headless display lifecycle runner.
//!
//! Usage:
//!   cargo run -p tether_tests --bin lifecycle_runner -- [--ticks 8] [--width 1280] [--height 720]
//!
//! Builds the full window resource tree over the null backend, polls and
//! presents for a bounded number of ticks, injects a close request, then
//! destroys the window and verifies nothing leaked.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tether_display::backend::{NullBackend, WindowEvent};
use tether_display::config::DisplayConfig;
use tether_display::window::{Window, WindowFlags};
use tether_registry::registry::Registry;
use tracing::info;

fn parse_args() -> (DisplayConfig, u32) {
    let mut config = DisplayConfig::default();
    let mut ticks = 8_u32;
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--ticks" if i + 1 < args.len() => {
                ticks = args[i + 1].parse().unwrap_or(8);
                i += 2;
            }
            "--width" if i + 1 < args.len() => {
                config.width = args[i + 1].parse().unwrap_or(config.width);
                i += 2;
            }
            "--height" if i + 1 < args.len() => {
                config.height = args[i + 1].parse().unwrap_or(config.height);
                i += 2;
            }
            _ => i += 1,
        }
    }
    (config, ticks)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (config, ticks) = parse_args();
    info!(width = config.width, height = config.height, ticks, "starting lifecycle run");

    let mut registry = Registry::new();
    let backend = Arc::new(NullBackend::new());
    let window = Window::create(&mut registry, backend.clone(), &config, WindowFlags::RESIZABLE)
        .context("window creation")?;

    for tick in 0..ticks {
        // Last tick: ask the window to close, as a real window system would.
        if tick + 1 == ticks {
            backend.push_event(WindowEvent::CloseRequested);
        }
        let win = registry.get_mut(window)?;
        win.poll_events();
        if !win.is_open() {
            info!(tick, "close requested");
            break;
        }
        win.present()?;
    }

    let live = registry.len();
    registry.destroy(window).context("window teardown")?;
    info!(destroyed = live, "window tree destroyed");

    if !registry.is_empty() {
        anyhow::bail!("{} resources leaked", registry.len());
    }
    if backend.live() != 0 {
        anyhow::bail!("{} native handles leaked", backend.live());
    }
    info!("clean shutdown");
    Ok(())
}

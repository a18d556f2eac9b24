//! Display configuration.
//!
//! Loaded from JSON strings (file IO left to the app).

use serde::{Deserialize, Serialize};

/// Window and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Window title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Frames prepared in flight; the window rotates through them.
    #[serde(default = "default_frames_in_flight")]
    pub frames_in_flight: u32,
}

fn default_title() -> String {
    "Window".to_string()
}

fn default_frames_in_flight() -> u32 {
    2
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: 1280,
            height: 720,
            frames_in_flight: default_frames_in_flight(),
        }
    }
}

impl DisplayConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

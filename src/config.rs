use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::Eye;

pub const DEFAULT_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub blink: BlinkConfig,
    pub gestures: GestureConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// EMA divisor, 1 = no smoothing.
    pub smoothing: u32,
    pub sensitivity_x: f32,
    pub sensitivity_y: f32,
    pub enable_cursor: bool,
    pub enable_click: bool,
    pub enable_gestures: bool,
    /// Face mesh index of the tracked iris centre.
    pub iris_index: usize,
    /// Normalized iris range mapped onto the screen, per axis.
    pub gaze_window_x: [f32; 2],
    pub gaze_window_y: [f32; 2],
    pub edge_margin: i32,
    pub move_duration_ms: u64,
    /// Overrides the size reported by the actuator.
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub eye: Eye,
    pub threshold: f32,
    pub cooldown_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub cooldown_s: f64,
    /// VICTORY stamps its cooldown this far in the past.
    pub victory_credit_s: f64,
    /// Wheel units, negative scrolls down.
    pub scroll_delta: i32,
    pub browser_url: String,
    pub media_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub text_scale: u32,
    pub show_landmarks: bool,
    pub landmark_color_hex: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            smoothing: 5,
            sensitivity_x: 2.5,
            sensitivity_y: 2.5,
            enable_cursor: true,
            enable_click: true,
            enable_gestures: true,
            iris_index: 473,
            gaze_window_x: [0.43, 0.57],
            gaze_window_y: [0.43, 0.53],
            edge_margin: 25,
            move_duration_ms: 50,
            screen_width: None,
            screen_height: None,
            mirror: true,
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            eye: Eye::Left,
            threshold: 0.26,
            cooldown_s: 0.5,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cooldown_s: 1.0,
            victory_credit_s: 0.2,
            scroll_delta: -300,
            browser_url: "https://www.google.com".to_string(),
            media_key: "playpause".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            text_scale: 3,
            show_landmarks: true,
            landmark_color_hex: "#00FF00".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file is missing or
    /// unparsable. A missing or readable file is written back so new fields
    /// show up in it; an unparsable one is left untouched.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Configuration file not found. Creating default at {}", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config.sanitized());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config.save(path)?;
                Ok(config.sanitized())
            }
            Err(e) => {
                warn!("Error parsing config: {}. Loading defaults, {} left as is.", e, path.display());
                Ok(Self::default().sanitized())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Clamps every option into its recognized range.
    pub fn sanitized(mut self) -> Self {
        let t = &mut self.tracking;
        if !(1..=10).contains(&t.smoothing) {
            warn!("smoothing {} out of range 1-10, clamping", t.smoothing);
            t.smoothing = t.smoothing.clamp(1, 10);
        }
        t.sensitivity_x = clamp_sensitivity("sensitivity_x", t.sensitivity_x);
        t.sensitivity_y = clamp_sensitivity("sensitivity_y", t.sensitivity_y);
        if t.edge_margin < 0 {
            warn!("edge_margin {} is negative, using 0", t.edge_margin);
            t.edge_margin = 0;
        }

        let b = &mut self.blink;
        if !(b.threshold > 0.0 && b.threshold < 1.0) {
            warn!("blink threshold {} outside (0, 1), using default", b.threshold);
            b.threshold = BlinkConfig::default().threshold;
        }
        if !(b.cooldown_s >= 0.0) {
            b.cooldown_s = BlinkConfig::default().cooldown_s;
        }

        let g = &mut self.gestures;
        if !(g.cooldown_s >= 0.0) {
            g.cooldown_s = GestureConfig::default().cooldown_s;
        }
        if !(g.victory_credit_s >= 0.0) {
            g.victory_credit_s = 0.0;
        }

        self.ui.text_scale = self.ui.text_scale.max(1);
        self
    }
}

fn clamp_sensitivity(name: &str, value: f32) -> f32 {
    if (1.0..=5.0).contains(&value) {
        value
    } else {
        warn!("{} {} out of range 1.0-5.0, clamping", name, value);
        if value.is_nan() {
            1.0
        } else {
            value.clamp(1.0, 5.0)
        }
    }
}

/// Parses `#RRGGBB`, red on anything else.
pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    if hex.len() == 7 && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        (r, g, b)
    } else {
        (255, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex("#00FF00"), (0, 255, 0));
        assert_eq!(parse_hex("invalid"), (255, 0, 0));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let c: AppConfig =
            serde_json::from_str(r#"{"tracking": {"smoothing": 3}, "blink": {"eye": "right"}}"#)
                .unwrap();
        assert_eq!(c.tracking.smoothing, 3);
        assert_eq!(c.tracking.sensitivity_x, 2.5);
        assert_eq!(c.blink.eye, Eye::Right);
        assert_eq!(c.gestures.scroll_delta, -300);
    }

    #[test]
    fn sanitize_clamps_ranges() {
        let mut c = AppConfig::default();
        c.tracking.smoothing = 0;
        c.tracking.sensitivity_x = 9.0;
        c.tracking.sensitivity_y = f32::NAN;
        c.blink.threshold = 2.0;
        let c = c.sanitized();
        assert_eq!(c.tracking.smoothing, 1);
        assert_eq!(c.tracking.sensitivity_x, 5.0);
        assert_eq!(c.tracking.sensitivity_y, 1.0);
        assert_eq!(c.blink.threshold, 0.26);
    }

    #[test]
    fn load_creates_and_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let first = AppConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, AppConfig::default());

        fs::write(&path, "{ not json").unwrap();
        let fallback = AppConfig::load(&path).unwrap();
        assert_eq!(fallback, AppConfig::default());
    }

    #[test]
    fn unparsable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let typo = r#"{"tracking": {"smoothing": 3,}}"#;
        fs::write(&path, typo).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, AppConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), typo);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Every section falls back to its defaults when absent, so a config file
//! only needs to list the values it overrides.

use crate::app::expression_overlay::VideoContentFit;
use crate::app::trigger::TriggerPolicy;
use crate::constants::{app_info, detector, overlay, placement, smoothing, timing, trigger};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Display reweighting and moving-average settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Multiplier for non-neutral expressions
    pub boost: f64,
    /// Multiplier for the neutral expression
    pub neutral_damping: f64,
    /// Weight of the newest frame (0.0..=1.0)
    pub alpha: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            boost: smoothing::EXPRESSION_BOOST,
            neutral_damping: smoothing::NEUTRAL_DAMPING,
            alpha: smoothing::BLEND_ALPHA,
        }
    }
}

/// Label placement geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Gap between face box and label
    pub padding: f32,
    /// Margin a previous anchor must keep to be reused
    pub sticky_margin: f32,
    /// Margin for fresh right/left candidates
    pub horizontal_margin: f32,
    /// Margin for fresh bottom/top candidates
    pub vertical_margin: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            padding: placement::LABEL_PADDING,
            sticky_margin: placement::STICKY_MARGIN,
            horizontal_margin: placement::HORIZONTAL_MARGIN,
            vertical_margin: placement::VERTICAL_MARGIN,
        }
    }
}

/// Hidden trigger settings
///
/// Durations are stored in milliseconds to keep the file format readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub policy: TriggerPolicy,
    pub surprised_threshold: f64,
    pub happy_threshold: f64,
    pub angry_threshold: f64,
    pub hold_ms: u64,
    pub golden_window_ms: u64,
    pub glitch_ms: u64,
    pub followup_window_ms: u64,
    pub cooldown_ms: u64,
    pub combo_window_ms: u64,
    /// Per-tick trigger probability inside the combo window
    pub combo_chance: f64,
    /// Fixed RNG seed for reproducible combo runs
    pub seed: Option<u64>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            policy: TriggerPolicy::default(),
            surprised_threshold: trigger::SURPRISED_THRESHOLD,
            happy_threshold: trigger::HAPPY_THRESHOLD,
            angry_threshold: trigger::ANGRY_THRESHOLD,
            hold_ms: trigger::HOLD_DURATION.as_millis() as u64,
            golden_window_ms: trigger::GOLDEN_WINDOW.as_millis() as u64,
            glitch_ms: trigger::GLITCH_DURATION.as_millis() as u64,
            followup_window_ms: trigger::FOLLOWUP_WINDOW.as_millis() as u64,
            cooldown_ms: trigger::COOLDOWN.as_millis() as u64,
            combo_window_ms: trigger::COMBO_WINDOW.as_millis() as u64,
            combo_chance: trigger::COMBO_CHANCE,
            seed: None,
        }
    }
}

impl TriggerConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn golden_window(&self) -> Duration {
        Duration::from_millis(self.golden_window_ms)
    }

    pub fn glitch(&self) -> Duration {
        Duration::from_millis(self.glitch_ms)
    }

    pub fn followup_window(&self) -> Duration {
        Duration::from_millis(self.followup_window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn combo_window(&self) -> Duration {
        Duration::from_millis(self.combo_window_ms)
    }
}

/// Settings handed to the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Model input resolution (square, multiple of 32)
    pub input_size: u32,
    /// Minimum detection confidence
    pub score_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: detector::INPUT_SIZE,
            score_threshold: detector::SCORE_THRESHOLD,
        }
    }
}

/// Render loop and inference cadence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub inference_interval_ms: u64,
    pub render_interval_ms: u64,
    pub pulse_duration_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inference_interval_ms: timing::INFERENCE_INTERVAL.as_millis() as u64,
            render_interval_ms: timing::RENDER_INTERVAL.as_millis() as u64,
            pulse_duration_ms: timing::PULSE_DURATION.as_millis() as u64,
        }
    }
}

impl SessionConfig {
    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn pulse_duration(&self) -> Duration {
        Duration::from_millis(self.pulse_duration_ms)
    }
}

/// Overlay appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Expressions listed per label
    pub max_label_lines: usize,
    /// How the camera frame is fitted into the viewport
    pub content_fit: VideoContentFit,
    /// Mirror the overlay horizontally (selfie mode)
    pub mirrored: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_label_lines: overlay::MAX_LABEL_LINES,
            content_fit: VideoContentFit::default(),
            mirrored: true, // Default to mirrored (selfie mode)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub smoothing: SmoothingConfig,
    pub placement: PlacementConfig,
    pub trigger: TriggerConfig,
    pub detector: DetectorConfig,
    pub session: SessionConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    /// Default location: `<config dir>/moodcam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_NAME).join("config.json"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&contents)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check value ranges that the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("smoothing.alpha", self.smoothing.alpha)?;
        check_unit("trigger.combo_chance", self.trigger.combo_chance)?;
        check_unit("trigger.surprised_threshold", self.trigger.surprised_threshold)?;
        check_unit("trigger.happy_threshold", self.trigger.happy_threshold)?;
        check_unit("trigger.angry_threshold", self.trigger.angry_threshold)?;

        if self.smoothing.boost < 0.0 || self.smoothing.neutral_damping < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "smoothing",
                message: "weights must not be negative".to_string(),
            });
        }

        let margins = [
            self.placement.padding,
            self.placement.sticky_margin,
            self.placement.horizontal_margin,
            self.placement.vertical_margin,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "placement",
                message: "padding and margins must be finite and non-negative".to_string(),
            });
        }

        if self.session.inference_interval_ms == 0 || self.session.render_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session",
                message: "intervals must be greater than zero".to_string(),
            });
        }

        if self.detector.input_size == 0 || self.detector.input_size % 32 != 0 {
            return Err(ConfigError::InvalidValue {
                field: "detector.input_size",
                message: format!("{} is not a positive multiple of 32", self.detector.input_size),
            });
        }

        if self.overlay.max_label_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "overlay.max_label_lines",
                message: "at least one line is required".to_string(),
            });
        }

        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            message: format!("{} is not within 0.0..=1.0", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "trigger": { "policy": "combo", "seed": 7 } }"#)
            .expect("partial config should parse");

        assert_eq!(config.trigger.policy, TriggerPolicy::Combo);
        assert_eq!(config.trigger.seed, Some(7));
        assert_eq!(config.trigger.hold_ms, 5000);
        assert_eq!(config.smoothing, SmoothingConfig::default());
    }

    #[test]
    fn test_rejects_out_of_range_alpha() {
        let err = Config::from_json(r#"{ "smoothing": { "alpha": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "smoothing.alpha",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_input_size() {
        let err = Config::from_json(r#"{ "detector": { "input_size": 100 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let json = Config::default().to_json_pretty().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/moodcam.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}

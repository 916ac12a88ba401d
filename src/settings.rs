//! Scene tunables and platform presets
//!
//! Pages can override any field with a JSON blob; missing fields fall back to
//! the preset for the detected platform class.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Device class, used to pick motion presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformClass {
    #[default]
    Desktop,
    /// Phones/tablets: irregular frame timing, so slower and more damped
    Mobile,
}

impl PlatformClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformClass::Desktop => "Desktop",
            PlatformClass::Mobile => "Mobile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" => Some(PlatformClass::Desktop),
            "mobile" => Some(PlatformClass::Mobile),
            _ => None,
        }
    }

    /// Mobile if the user agent says so, or the viewport is narrow and touch-capable
    pub fn detect(user_agent: &str, viewport_width: f64, has_touch: bool) -> Self {
        const MOBILE_TOKENS: [&str; 5] = ["mobi", "android", "iphone", "ipad", "ipod"];
        let ua = user_agent.to_lowercase();
        if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) || (viewport_width < 900.0 && has_touch) {
            PlatformClass::Mobile
        } else {
            PlatformClass::Desktop
        }
    }

    /// Base swim speed (units/s)
    pub fn base_speed(&self) -> f32 {
        match self {
            PlatformClass::Desktop => DESKTOP_SPEED,
            PlatformClass::Mobile => MOBILE_SPEED,
        }
    }

    /// Vertical smoothing factor (smaller = more damping)
    pub fn smoothing(&self) -> f32 {
        match self {
            PlatformClass::Desktop => DESKTOP_SMOOTHING,
            PlatformClass::Mobile => MOBILE_SMOOTHING,
        }
    }
}

/// All simulation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AquariumConfig {
    pub platform: PlatformClass,

    // === Motion ===
    /// Base horizontal speed (units/s)
    pub base_speed: f32,
    /// Relative spread of per-fish speed around the base
    pub speed_jitter: f32,
    /// Exponential approach factor for the vertical glide, in (0, 1]
    pub smoothing: f32,
    /// Largest step the loop will integrate (seconds)
    pub max_dt: f32,

    // === Bounds ===
    /// How far past the edge a fish may drift before respawning
    pub respawn_margin: f32,
    /// Where outside the opposite edge a respawned fish starts
    pub reentry_offset: f32,
    /// Vertical band for baselines, as fractions of height
    pub spawn_band: (f32, f32),

    // === Oscillation ===
    pub amplitude_ratio: f32,
    pub special_amplitude_ratio: f32,
    pub waves_per_second: f32,
    pub special_waves_per_second: f32,

    // === Rendering ===
    /// Stand-in size until a node has laid out
    pub default_size: Vec2,
    pub default_depth: i32,

    // === Seaweed ===
    pub sway_rate: f32,
    pub sway_spacing: f32,
    pub sway_degrees: f32,
}

impl Default for AquariumConfig {
    fn default() -> Self {
        Self::for_platform(PlatformClass::Desktop)
    }
}

impl AquariumConfig {
    /// Preset for a platform class
    pub fn for_platform(platform: PlatformClass) -> Self {
        Self {
            platform,
            base_speed: platform.base_speed(),
            speed_jitter: SPEED_JITTER,
            smoothing: platform.smoothing(),
            max_dt: MAX_DT,
            respawn_margin: RESPAWN_MARGIN,
            reentry_offset: REENTRY_OFFSET,
            spawn_band: SPAWN_BAND,
            amplitude_ratio: AMPLITUDE_RATIO,
            special_amplitude_ratio: SPECIAL_AMPLITUDE_RATIO,
            waves_per_second: WAVES_PER_SECOND,
            special_waves_per_second: SPECIAL_WAVES_PER_SECOND,
            default_size: Vec2::new(DEFAULT_FISH_WIDTH, DEFAULT_FISH_HEIGHT),
            default_depth: DEFAULT_DEPTH,
            sway_rate: SWAY_RATE,
            sway_spacing: SWAY_SPACING,
            sway_degrees: SWAY_DEGREES,
        }
    }

    /// Parse overrides on top of a preset. The preset is the one named by a
    /// `platform` override if present, otherwise the detected `platform`.
    pub fn from_json(json: &str, platform: PlatformClass) -> Result<Self, ConfigError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let platform = match value.get("platform") {
            Some(named) => serde_json::from_value(named.clone())?,
            None => platform,
        };
        let preset = serde_json::to_value(Self::for_platform(platform))?;
        if let (Some(overrides), serde_json::Value::Object(base)) = (value.as_object_mut(), preset)
        {
            for (key, field) in base {
                overrides.entry(key).or_insert(field);
            }
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the motion model
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.base_speed) {
            return Err(ConfigError::Invalid {
                field: "base_speed",
                reason: "must be a positive number",
            });
        }
        if !(self.speed_jitter.is_finite() && (0.0..1.0).contains(&self.speed_jitter)) {
            return Err(ConfigError::Invalid {
                field: "speed_jitter",
                reason: "must be in [0, 1)",
            });
        }
        if !(positive(self.smoothing) && self.smoothing <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "smoothing",
                reason: "must be in (0, 1]",
            });
        }
        if !positive(self.max_dt) {
            return Err(ConfigError::Invalid {
                field: "max_dt",
                reason: "must be a positive number",
            });
        }
        let (lo, hi) = self.spawn_band;
        if !(lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo <= hi && hi <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "spawn_band",
                reason: "must satisfy 0 <= low <= high <= 1",
            });
        }
        if !(positive(self.default_size.x) && positive(self.default_size.y)) {
            return Err(ConfigError::Invalid {
                field: "default_size",
                reason: "both dimensions must be positive",
            });
        }
        let finite = [
            self.respawn_margin,
            self.reentry_offset,
            self.amplitude_ratio,
            self.special_amplitude_ratio,
            self.waves_per_second,
            self.special_waves_per_second,
            self.sway_rate,
            self.sway_spacing,
            self.sway_degrees,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "oscillation",
                reason: "margins, ratios and sway parameters must be finite",
            });
        }
        Ok(())
    }
}

//! Aquarium - animated fish tank with tracking selection overlays
//!
//! Core modules:
//! - `sim`: Fish simulation (registry, kinematics, frame loop, scene watcher)
//! - `overlay`: Selection regions that follow the fish every frame
//! - `platform`: Host abstraction (scene, overlay layer, tick source)
//! - `sorting`: Fruit sorting mini-game rules
//! - `settings`: Tunables and platform presets

pub mod error;
pub mod overlay;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod sorting;

pub use error::{ConfigError, SetupError};
pub use settings::{AquariumConfig, PlatformClass};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Scene configuration constants
pub mod consts {
    /// Largest simulated step per frame (seconds); absorbs throttled tabs
    pub const MAX_DT: f32 = 0.05;

    /// Exit margin past the viewport edge before a fish respawns
    pub const RESPAWN_MARGIN: f32 = 120.0;
    /// Distance outside the edge where a respawned fish re-enters
    pub const REENTRY_OFFSET: f32 = 150.0;

    /// Vertical band (fraction of height) where baselines are drawn
    pub const SPAWN_BAND: (f32, f32) = (0.2, 0.8);

    /// Fish swim speed (units/s) before jitter
    pub const DESKTOP_SPEED: f32 = 45.0;
    /// Slower on mobile to hide timer jitter
    pub const MOBILE_SPEED: f32 = 24.0;
    /// Speed is drawn within ±10% of the base
    pub const SPEED_JITTER: f32 = 0.1;

    /// Vertical low-pass coefficient
    pub const DESKTOP_SMOOTHING: f32 = 0.15;
    pub const MOBILE_SMOOTHING: f32 = 0.10;

    /// Oscillation amplitude as a fraction of viewport height
    pub const AMPLITUDE_RATIO: f32 = 0.0025;
    pub const SPECIAL_AMPLITUDE_RATIO: f32 = 0.005;
    /// Oscillation frequency (waves per second)
    pub const WAVES_PER_SECOND: f32 = 0.9;
    pub const SPECIAL_WAVES_PER_SECOND: f32 = 0.28;

    /// Size used before an image has a layout box
    pub const DEFAULT_FISH_WIDTH: f32 = 60.0;
    pub const DEFAULT_FISH_HEIGHT: f32 = 40.0;
    /// Stacking layer when the node doesn't declare one
    pub const DEFAULT_DEPTH: i32 = 5;

    /// Seaweed sway: phase rate (rad/s), per-plant phase spacing, peak angle (deg)
    pub const SWAY_RATE: f32 = 0.4;
    pub const SWAY_SPACING: f32 = 0.7;
    pub const SWAY_DEGREES: f32 = 0.8;
}

/// Axis-aligned rectangle in viewport units (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Rectangle of the given size sharing this one's center
    pub fn resized_about_center(&self, size: Vec2) -> Self {
        Self {
            pos: self.center() - size / 2.0,
            size,
        }
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            pos: self.pos + offset,
            size: self.size,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.y >= self.pos.y
            && point.x <= self.pos.x + self.size.x
            && point.y <= self.pos.y + self.size.y
    }
}

/// Viewport dimensions captured at setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_resize_keeps_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        let s = r.resized_about_center(Vec2::new(50.0, 10.0));
        assert_eq!(s.center(), r.center());
        assert_eq!(s.pos, Vec2::new(35.0, 40.0));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(r.contains(Vec2::new(10.0, 0.0)));
        assert!(!r.contains(Vec2::new(10.1, 5.0)));
    }

    #[test]
    fn test_degenerate_bounds() {
        assert!(Bounds::new(0.0, 600.0).is_degenerate());
        assert!(Bounds::new(f32::NAN, 600.0).is_degenerate());
        assert!(!Bounds::new(800.0, 600.0).is_degenerate());
    }
}

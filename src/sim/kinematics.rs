//! Per-fish motion model
//!
//! Horizontal motion is constant-velocity drift. Vertical motion follows a
//! sine target evaluated at absolute time, so the sway keeps the same speed no
//! matter how many frames were dropped; a low-pass then glides toward it.

use rand::Rng;

use super::state::{Fish, Transform, random_baseline, random_phase};
use crate::settings::AquariumConfig;
use crate::Bounds;

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub transform: Transform,
    /// Fish has drifted past the far edge and must respawn before the next step
    pub exited: bool,
}

/// Sway target at absolute time `now` (seconds)
#[inline]
pub fn target_y(fish: &Fish, now: f64) -> f32 {
    // f64 keeps the phase precise for long-running pages
    let phase = fish.phase_offset as f64 + now * fish.phase_speed as f64;
    fish.base_y + fish.amplitude * phase.sin() as f32
}

/// Advance one fish by `dt` seconds (already clamped by the caller)
pub fn step(fish: &mut Fish, dt: f32, now: f64, bounds: Bounds, config: &AquariumConfig) -> Step {
    let sign = fish.direction.sign();

    fish.x += fish.speed * sign * dt;

    let target = target_y(fish, now);
    fish.smooth_y += (target - fish.smooth_y) * config.smoothing;

    let size = fish.size_or(config.default_size);
    let anchor = glam::Vec2::new(fish.x, fish.smooth_y) - size / 2.0;
    let transform = Transform {
        anchor,
        size,
        heading: fish.direction,
    };

    let margin = config.respawn_margin;
    let exited = if sign > 0.0 {
        anchor.x > bounds.width + margin
    } else {
        anchor.x < -bounds.width - margin
    };

    Step { transform, exited }
}

/// Send a fish back in from the opposite side with fresh sway
pub fn respawn(fish: &mut Fish, bounds: Bounds, config: &AquariumConfig, rng: &mut impl Rng) {
    fish.direction = fish.direction.flipped();
    fish.x = if fish.direction.sign() > 0.0 {
        -config.reentry_offset
    } else {
        bounds.width + config.reentry_offset
    };

    fish.base_y = random_baseline(bounds, config, rng);
    fish.phase_offset = random_phase(rng);
    fish.smooth_y = fish.base_y;
}

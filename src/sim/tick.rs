//! Frame loop
//!
//! One call per display refresh: measure elapsed time, clamp it, step every
//! fish, and write the results back to the scene.

use super::kinematics;
use super::state::{Aquarium, known_size};
use crate::platform::SceneHost;

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Clamped step that was integrated (seconds)
    pub dt: f32,
    pub updated: usize,
    pub respawned: usize,
}

/// Drives the fish and the seaweed sway
#[derive(Debug, Default)]
pub struct SimulationLoop {
    last_time: Option<f64>,
    sway_phase: f32,
}

impl SimulationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing from `now` (ms) so the first frame doesn't integrate
    /// time spent in setup
    pub fn starting_at(now: f64) -> Self {
        Self {
            last_time: Some(now),
            sway_phase: 0.0,
        }
    }

    /// Seconds since the previous frame, clamped to `[0, max_dt]`
    fn advance_clock(&mut self, now: f64, max_dt: f32) -> f32 {
        let dt = match self.last_time {
            Some(last) => ((now - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);
        if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 }
    }

    /// Run one frame at timestamp `now` (ms)
    pub fn frame<S: SceneHost + ?Sized>(
        &mut self,
        aquarium: &mut Aquarium,
        scene: &mut S,
        now: f64,
    ) -> FrameReport {
        let dt = self.advance_clock(now, aquarium.config.max_dt);
        self.sway(dt, aquarium, scene);

        let Aquarium {
            config,
            bounds,
            registry,
            rng,
            ..
        } = aquarium;

        let clock = now / 1000.0;
        let mut report = FrameReport {
            dt,
            ..Default::default()
        };

        for fish in registry.iter_mut() {
            // Images that hadn't loaded at creation get measured once they have
            if fish.size.is_none() {
                fish.size = known_size(scene.node_size(fish.node));
            }

            let step = kinematics::step(fish, dt, clock, *bounds, config);
            scene.write_transform(fish.node, &step.transform);
            fish.rendered = Some(step.transform);
            report.updated += 1;

            if step.exited {
                kinematics::respawn(fish, *bounds, config, rng);
                scene.set_facing(fish.node, fish.direction);
                scene.set_depth(fish.node, fish.base_depth);
                report.respawned += 1;
                log::trace!("Fish {:?} respawned heading {:?}", fish.node, fish.direction);
            }
        }

        report
    }

    fn sway<S: SceneHost + ?Sized>(&mut self, dt: f32, aquarium: &Aquarium, scene: &mut S) {
        let config = &aquarium.config;
        self.sway_phase += dt * config.sway_rate;
        for (i, node) in aquarium.seaweed.iter().enumerate() {
            let angle = (self.sway_phase + i as f32 * config.sway_spacing).sin() * config.sway_degrees;
            scene.write_sway(*node, angle);
        }
    }
}

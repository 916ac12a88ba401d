//! Fish records and the simulation context
//!
//! `Aquarium` is the one owner of simulation state. The frame loop, scene
//! watcher and overlay all borrow it; there are no globals.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::kind::Kind;
use super::registry::EntityRegistry;
use crate::error::SetupError;
use crate::platform::{NodeCategory, NodeId, NodeInfo, SceneHost};
use crate::settings::AquariumConfig;
use crate::Bounds;

/// Horizontal swim direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn from_facing(facing_left: bool) -> Self {
        if facing_left { Direction::Left } else { Direction::Right }
    }

    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Rendered placement of a fish: top-left anchor, the size the anchor was
/// computed from, and horizontal mirroring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub anchor: Vec2,
    pub size: Vec2,
    pub heading: Direction,
}

impl Transform {
    /// CSS form, `translate(x, y) scaleX(±1)`
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scaleX({})",
            self.anchor.x,
            self.anchor.y,
            self.heading.sign()
        )
    }
}

/// Simulation record for one swimming node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
    pub node: NodeId,
    pub kind: Kind,
    /// Horizontal center
    pub x: f32,
    /// Vertical center the sway oscillates around
    pub base_y: f32,
    /// Low-passed vertical center
    pub smooth_y: f32,
    pub direction: Direction,
    /// Units per second
    pub speed: f32,
    pub amplitude: f32,
    /// Radians per second
    pub phase_speed: f32,
    pub phase_offset: f32,
    /// Laid-out size; `None` until the node has a layout box
    pub size: Option<Vec2>,
    /// Stacking layer read at creation; restored on respawn, never changed
    pub base_depth: i32,
    /// Last transform written by the frame loop
    pub rendered: Option<Transform>,
}

impl Fish {
    /// Fresh record for a newly observed node
    pub fn spawn(
        node: NodeId,
        info: &NodeInfo,
        size: Vec2,
        bounds: Bounds,
        config: &AquariumConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let kind = Kind::classify(&info.src);
        let (amplitude_ratio, waves_per_second) = if Kind::is_special_asset(&info.src) {
            (config.special_amplitude_ratio, config.special_waves_per_second)
        } else {
            (config.amplitude_ratio, config.waves_per_second)
        };

        let jitter = config.speed_jitter;
        let speed = config.base_speed * (1.0 - jitter + rng.random::<f32>() * 2.0 * jitter);
        let base_y = random_baseline(bounds, config, rng);

        Self {
            node,
            kind,
            x: rng.random::<f32>() * bounds.width,
            base_y,
            smooth_y: base_y,
            direction: Direction::from_facing(info.facing_left),
            speed,
            amplitude: bounds.height * amplitude_ratio,
            phase_speed: std::f32::consts::TAU * waves_per_second,
            phase_offset: random_phase(rng),
            size: known_size(size),
            base_depth: info.depth.unwrap_or(config.default_depth),
            rendered: None,
        }
    }

    /// Cached size, or the configured stand-in while layout is pending
    #[inline]
    pub fn size_or(&self, fallback: Vec2) -> Vec2 {
        self.size.unwrap_or(fallback)
    }
}

/// Baseline within the configured vertical band
pub(crate) fn random_baseline(bounds: Bounds, config: &AquariumConfig, rng: &mut impl Rng) -> f32 {
    let (lo, hi) = config.spawn_band;
    bounds.height * (lo + rng.random::<f32>() * (hi - lo))
}

/// Uniform in [0, 2π)
pub(crate) fn random_phase(rng: &mut impl Rng) -> f32 {
    rng.random::<f32>() * std::f32::consts::TAU
}

/// Zero or non-finite sizes mean "not laid out yet"
pub(crate) fn known_size(size: Vec2) -> Option<Vec2> {
    (size.is_finite() && size.x > 0.0 && size.y > 0.0).then_some(size)
}

/// Simulation context: configuration, bounds, live fish and the RNG
#[derive(Debug)]
pub struct Aquarium {
    pub config: AquariumConfig,
    /// Container size read once at setup
    pub bounds: Bounds,
    pub registry: EntityRegistry,
    /// Seaweed nodes, in document order (sway phase spacing follows it)
    pub seaweed: Vec<NodeId>,
    pub(crate) rng: Pcg32,
}

impl Aquarium {
    /// Measure the container and register every fish already in it
    pub fn new<S: SceneHost + ?Sized>(
        config: AquariumConfig,
        scene: &S,
        seed: u64,
    ) -> Result<Self, SetupError> {
        config.validate()?;

        let bounds = scene
            .container_bounds()
            .ok_or_else(|| SetupError::MissingContainer {
                id: "aquarium".to_string(),
            })?;
        if bounds.is_degenerate() {
            return Err(SetupError::DegenerateViewport {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let mut aquarium = Self {
            config,
            bounds,
            registry: EntityRegistry::new(),
            seaweed: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        };

        for node in scene.children() {
            let Some(info) = scene.describe(node) else {
                continue;
            };
            match info.category {
                NodeCategory::Fish => {
                    aquarium.register(node, &info, scene);
                }
                NodeCategory::BottomObject if Kind::classify(&info.src) == Kind::Seaweed => {
                    aquarium.seaweed.push(node);
                }
                _ => {}
            }
        }

        log::info!(
            "Aquarium ready: {}x{}, {} fish, {} seaweed, {:?} preset",
            bounds.width,
            bounds.height,
            aquarium.registry.len(),
            aquarium.seaweed.len(),
            aquarium.config.platform
        );

        Ok(aquarium)
    }

    /// Register `node` if it is a fish; returns true if a record was created
    pub fn add_entity<S: SceneHost + ?Sized>(&mut self, node: NodeId, scene: &S) -> bool {
        match scene.describe(node) {
            Some(info) if info.category == NodeCategory::Fish => self.register(node, &info, scene),
            _ => false,
        }
    }

    /// Drop the record for `node`; no-op if unknown
    pub fn remove_entity(&mut self, node: NodeId) -> bool {
        let removed = self.registry.remove(node);
        if removed {
            log::debug!("Fish {:?} left the tank", node);
        }
        removed
    }

    fn register<S: SceneHost + ?Sized>(&mut self, node: NodeId, info: &NodeInfo, scene: &S) -> bool {
        let added = self.registry.add(
            node,
            info,
            scene.node_size(node),
            self.bounds,
            &self.config,
            &mut self.rng,
        );
        if added {
            log::debug!("Fish {:?} joined the tank ({})", node, info.src);
        }
        added
    }
}

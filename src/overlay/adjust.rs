//! Per-kind fit of selection regions to the artwork
//!
//! Images carry transparent padding, so a region the size of the image box
//! looks loose. Each kind gets a nudge and a shrink, applied about the
//! region's center.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Kind, Side};
use crate::Rect;

/// How a region is fitted to its node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    /// Translate by `offset`, then scale uniformly
    Uniform { offset: Vec2, scale: f32 },
    /// Translate by `offset`, then scale each axis separately
    Stretch { offset: Vec2, scale: Vec2 },
}

/// Baseline: slightly left, full size
pub const DEFAULT_ADJUSTMENT: Adjustment = uniform(-8.0, 0.0, 1.0);

const fn uniform(dx: f32, dy: f32, scale: f32) -> Adjustment {
    Adjustment::Uniform {
        offset: Vec2::new(dx, dy),
        scale,
    }
}

impl Default for Adjustment {
    fn default() -> Self {
        DEFAULT_ADJUSTMENT
    }
}

impl Adjustment {
    pub fn for_kind(kind: Kind) -> Self {
        match kind {
            Kind::Goldfish => uniform(-8.0, -20.0, 0.55),
            Kind::Seahorse => uniform(-8.0, 10.0, 0.82),
            // Tail-heavy art: shift toward the tail
            Kind::YellowTang => uniform(15.0, 15.0, 0.45),
            Kind::BlueBeta => uniform(15.0, 0.0, 0.45),
            Kind::RedBeta => uniform(-8.0, 0.0, 0.45),
            Kind::Clownfish => uniform(-8.0, 0.0, 0.35),
            Kind::Jellyfish => uniform(-8.0, 0.0, 0.4),
            Kind::Seaweed => uniform(-40.0, -10.0, 0.6),
            Kind::Anemone(side) => {
                let dx = match side {
                    Some(Side::Left) => 12.0,
                    Some(Side::Right) => -34.0,
                    None => -8.0,
                };
                uniform(dx, 30.0, 0.7)
            }
            Kind::Crab => uniform(-8.0, 0.0, 0.39),
            // Wide and flat: keep the width, squash the height
            Kind::Shell => Adjustment::Stretch {
                offset: Vec2::new(20.0, 0.0),
                scale: Vec2::new(1.0, 0.3),
            },
            Kind::Unknown => DEFAULT_ADJUSTMENT,
        }
    }

    pub fn offset(&self) -> Vec2 {
        match self {
            Adjustment::Uniform { offset, .. } | Adjustment::Stretch { offset, .. } => *offset,
        }
    }

    pub fn scale(&self) -> Vec2 {
        match self {
            Adjustment::Uniform { scale, .. } => Vec2::splat(*scale),
            Adjustment::Stretch { scale, .. } => *scale,
        }
    }

    /// Fitted rectangle for a region whose untransformed box is `base`
    pub fn apply(&self, base: &Rect) -> Rect {
        base.translated(self.offset())
            .resized_about_center(base.size * self.scale())
    }

    /// CSS form, `translate(dx px, dy px) scale(..)` with a centered origin
    pub fn to_css(&self) -> String {
        let offset = self.offset();
        match self {
            Adjustment::Uniform { scale, .. } => {
                format!("translate({}px,{}px) scale({})", offset.x, offset.y, scale)
            }
            Adjustment::Stretch { scale, .. } => format!(
                "translate({}px,{}px) scale({}, {})",
                offset.x, offset.y, scale.x, scale.y
            ),
        }
    }
}

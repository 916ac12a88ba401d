//! Selection overlay
//!
//! One clickable region per fish and per tank-floor decoration. Fish regions
//! follow the transform the frame loop stored on each fish record; static
//! regions are placed from layout and only move on resize. A region's
//! "active" flag is pure UI state and never feeds back into the simulation.

pub mod adjust;

pub use adjust::{Adjustment, DEFAULT_ADJUSTMENT};

use std::collections::BTreeMap;

use glam::Vec2;

use crate::platform::{NodeCategory, NodeId, OverlayLayer, SceneHost};
use crate::sim::{EntityRegistry, Kind, Membership};
use crate::Rect;

/// A selection region bound to one scene node
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRegion {
    pub bound: NodeId,
    pub kind: Kind,
    /// Untransformed box (node position and size)
    pub base: Rect,
    pub adjustment: Adjustment,
    pub active: bool,
    /// Follows a fish every frame, as opposed to being placed from layout
    pub animated: bool,
    /// Creation order; later regions sit on top
    seq: u64,
}

impl OverlayRegion {
    /// Box actually shown on screen
    pub fn bounds(&self) -> Rect {
        self.adjustment.apply(&self.base)
    }
}

/// Result of routing a click into the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A region took the click; it must not propagate further
    Handled { bound: NodeId, active: bool },
    Ignored,
}

#[derive(Debug, Default)]
pub struct OverlayManager {
    regions: BTreeMap<NodeId, OverlayRegion>,
    next_seq: u64,
}

impl OverlayManager {
    /// Create regions for every fish and decoration currently in the scene
    pub fn setup<S, L>(scene: &S, registry: &EntityRegistry, layer: &mut L) -> Self
    where
        S: SceneHost + ?Sized,
        L: OverlayLayer + ?Sized,
    {
        let mut manager = Self::default();
        for node in scene.children() {
            let Some(info) = scene.describe(node) else {
                continue;
            };
            match info.category {
                NodeCategory::Fish if registry.contains(node) => {
                    manager.track_fish(node, scene, registry, layer);
                }
                NodeCategory::BottomObject => {
                    let base = scene.layout_rect(node).unwrap_or_default();
                    manager.create(node, Kind::classify(&info.src), base, false, layer);
                }
                _ => {}
            }
        }
        log::info!("Overlay ready: {} regions", manager.regions.len());
        manager
    }

    /// Add or drop fish regions to match registry changes
    pub fn apply_membership<S, L>(
        &mut self,
        changes: &[Membership],
        scene: &S,
        registry: &EntityRegistry,
        layer: &mut L,
    ) where
        S: SceneHost + ?Sized,
        L: OverlayLayer + ?Sized,
    {
        for change in changes {
            match *change {
                Membership::Joined(node) => {
                    if !self.regions.contains_key(&node) && registry.contains(node) {
                        self.track_fish(node, scene, registry, layer);
                    }
                }
                Membership::Left(node) => {
                    if self.regions.remove(&node).is_some() {
                        layer.remove_region(node);
                    }
                }
            }
        }
    }

    /// Move fish regions onto the transforms from the latest frame. Regions
    /// whose fish hasn't been drawn yet stay where they are.
    pub fn frame<L: OverlayLayer + ?Sized>(
        &mut self,
        registry: &EntityRegistry,
        layer: &mut L,
    ) -> usize {
        let mut moved = 0;
        for region in self.regions.values_mut().filter(|r| r.animated) {
            let Some(transform) = registry.get(region.bound).and_then(|f| f.rendered) else {
                continue;
            };
            let base = Rect {
                pos: transform.anchor,
                size: transform.size,
            };
            if base != region.base {
                region.base = base;
                layer.place_region(region.bound, &region.base, &region.adjustment);
                moved += 1;
            }
        }
        moved
    }

    /// Re-read layout for static regions after a viewport resize
    pub fn relayout_static<S, L>(&mut self, scene: &S, layer: &mut L)
    where
        S: SceneHost + ?Sized,
        L: OverlayLayer + ?Sized,
    {
        for region in self.regions.values_mut().filter(|r| !r.animated) {
            if let Some(rect) = scene.layout_rect(region.bound) {
                region.base = rect;
            }
            region.adjustment = Adjustment::for_kind(region.kind);
            layer.place_region(region.bound, &region.base, &region.adjustment);
        }
    }

    /// Flip one region's active flag; returns the new state
    pub fn toggle<L: OverlayLayer + ?Sized>(&mut self, bound: NodeId, layer: &mut L) -> Option<bool> {
        let region = self.regions.get_mut(&bound)?;
        region.active = !region.active;
        layer.set_active(bound, region.active);
        Some(region.active)
    }

    /// Toggle the topmost region under `point`, if any
    pub fn click<L: OverlayLayer + ?Sized>(&mut self, point: Vec2, layer: &mut L) -> ClickOutcome {
        let hit = self
            .regions
            .values()
            .filter(|r| r.bounds().contains(point))
            .max_by_key(|r| r.seq)
            .map(|r| r.bound);

        match hit.and_then(|bound| self.toggle(bound, layer).map(|active| (bound, active))) {
            Some((bound, active)) => ClickOutcome::Handled { bound, active },
            None => ClickOutcome::Ignored,
        }
    }

    pub fn region(&self, bound: NodeId) -> Option<&OverlayRegion> {
        self.regions.get(&bound)
    }

    pub fn regions(&self) -> impl Iterator<Item = &OverlayRegion> {
        self.regions.values()
    }

    /// Number of regions bound to fish
    pub fn animated_count(&self) -> usize {
        self.regions.values().filter(|r| r.animated).count()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn track_fish<S, L>(&mut self, node: NodeId, scene: &S, registry: &EntityRegistry, layer: &mut L)
    where
        S: SceneHost + ?Sized,
        L: OverlayLayer + ?Sized,
    {
        let Some(fish) = registry.get(node) else {
            return;
        };
        // Before the first frame there is no transform; start from layout
        let base = fish
            .rendered
            .map(|t| Rect {
                pos: t.anchor,
                size: t.size,
            })
            .or_else(|| scene.layout_rect(node))
            .unwrap_or_default();
        self.create(node, fish.kind, base, true, layer);
    }

    fn create<L: OverlayLayer + ?Sized>(
        &mut self,
        bound: NodeId,
        kind: Kind,
        base: Rect,
        animated: bool,
        layer: &mut L,
    ) {
        let region = OverlayRegion {
            bound,
            kind,
            base,
            adjustment: Adjustment::for_kind(kind),
            active: false,
            animated,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        layer.create_region(bound);
        layer.place_region(bound, &region.base, &region.adjustment);
        self.regions.insert(bound, region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessOverlay, HeadlessScene, ManualTickSource};
    use crate::platform::{NodeInfo, run_loop};
    use crate::settings::AquariumConfig;
    use crate::sim::{Aquarium, SceneWatcher, SimulationLoop};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn populated_scene() -> (HeadlessScene, Vec<NodeId>) {
        let mut scene = HeadlessScene::new(800.0, 600.0);
        let fish = vec![
            scene.insert(
                NodeInfo::fish("fish_goldfish.png", false),
                Rect::new(0.0, 0.0, 80.0, 50.0),
            ),
            scene.insert(
                NodeInfo::fish("fish_goldfish.png", true),
                Rect::new(0.0, 0.0, 80.0, 50.0),
            ),
        ];
        scene.insert(
            NodeInfo::bottom_object("bottom_shell.png"),
            Rect::new(300.0, 540.0, 120.0, 40.0),
        );
        scene.take_changes();
        (scene, fish)
    }

    #[test]
    fn test_setup_creates_region_per_node() {
        let (scene, fish) = populated_scene();
        let aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);

        assert_eq!(overlay.len(), 3);
        assert_eq!(overlay.animated_count(), aquarium.registry.len());
        assert_eq!(layer.regions.len(), 3);
        for node in fish {
            assert!(overlay.region(node).unwrap().animated);
        }
        let shell = overlay.regions().find(|r| r.kind == Kind::Shell).unwrap();
        assert!(!shell.animated);
        assert_eq!(shell.base, Rect::new(300.0, 540.0, 120.0, 40.0));
    }

    #[test]
    fn test_toggle_is_independent_per_region() {
        let (mut scene, fish) = populated_scene();
        let mut aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let mut overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);
        let mut sim = SimulationLoop::starting_at(0.0);
        sim.frame(&mut aquarium, &mut scene, 16.0);
        overlay.frame(&aquarium.registry, &mut layer);

        let (a, b) = (fish[0], fish[1]);
        let b_before = overlay.region(b).unwrap().clone();
        let fish_before = aquarium.registry.get(a).unwrap().clone();

        assert_eq!(overlay.toggle(a, &mut layer), Some(true));
        assert!(overlay.region(a).unwrap().active);
        assert!(layer.region(a).unwrap().active);

        assert_eq!(overlay.region(b).unwrap(), &b_before);
        assert!(!layer.region(b).unwrap().active);

        // Selecting never touches the simulation
        let fish_after = aquarium.registry.get(a).unwrap();
        assert_eq!(fish_after.x, fish_before.x);
        assert_eq!(fish_after.smooth_y, fish_before.smooth_y);

        assert_eq!(overlay.toggle(a, &mut layer), Some(false));
        assert_eq!(overlay.toggle(NodeId(999), &mut layer), None);
    }

    #[test]
    fn test_click_hits_fitted_bounds() {
        let (scene, _) = populated_scene();
        let aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let mut overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);

        // Shell region: center (360+20, 560), size 120x12
        let outcome = overlay.click(Vec2::new(380.0, 560.0), &mut layer);
        let shell = overlay.regions().find(|r| r.kind == Kind::Shell).unwrap().bound;
        assert_eq!(
            outcome,
            ClickOutcome::Handled {
                bound: shell,
                active: true
            }
        );

        // Inside the raw image box but outside the squashed region
        let outcome = overlay.click(Vec2::new(380.0, 545.0), &mut layer);
        assert_eq!(outcome, ClickOutcome::Ignored);
    }

    #[test]
    fn test_region_stays_put_until_fish_is_drawn() {
        let (scene, fish) = populated_scene();
        let aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let mut overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);
        let before = overlay.region(fish[0]).unwrap().base;

        assert_eq!(overlay.frame(&aquarium.registry, &mut layer), 0);
        assert_eq!(overlay.region(fish[0]).unwrap().base, before);
    }

    #[test]
    fn test_membership_keeps_region_count_in_step() {
        let (mut scene, _) = populated_scene();
        let mut aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let mut overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);
        let watcher = SceneWatcher::new();

        let added = scene.insert(
            NodeInfo::fish("fish_blue_beta.png", false),
            Rect::new(0.0, 0.0, 70.0, 40.0),
        );
        let changes = scene.take_changes();
        let membership = watcher.apply(&changes, &mut aquarium, &scene);
        overlay.apply_membership(&membership, &scene, &aquarium.registry, &mut layer);
        assert_eq!(overlay.animated_count(), aquarium.registry.len());
        assert_eq!(overlay.region(added).unwrap().kind, Kind::BlueBeta);

        scene.remove(added);
        let changes = scene.take_changes();
        let membership = watcher.apply(&changes, &mut aquarium, &scene);
        overlay.apply_membership(&membership, &scene, &aquarium.registry, &mut layer);
        assert_eq!(overlay.animated_count(), aquarium.registry.len());
        assert!(overlay.region(added).is_none());
        assert!(layer.region(added).is_none());
    }

    #[test]
    fn test_resize_relayouts_static_only() {
        let (mut scene, fish) = populated_scene();
        let mut aquarium = Aquarium::new(AquariumConfig::default(), &scene, 1).unwrap();
        let mut layer = HeadlessOverlay::new();
        let mut overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);
        let mut sim = SimulationLoop::starting_at(0.0);
        sim.frame(&mut aquarium, &mut scene, 16.0);
        overlay.frame(&aquarium.registry, &mut layer);
        let fish_region = overlay.region(fish[0]).unwrap().base;

        let shell = overlay.regions().find(|r| r.kind == Kind::Shell).unwrap().bound;
        scene.set_layout(shell, Rect::new(200.0, 400.0, 90.0, 30.0));
        overlay.relayout_static(&scene, &mut layer);

        assert_eq!(overlay.region(shell).unwrap().base, Rect::new(200.0, 400.0, 90.0, 30.0));
        assert_eq!(layer.region(shell).unwrap().base, Rect::new(200.0, 400.0, 90.0, 30.0));
        assert_eq!(overlay.region(fish[0]).unwrap().base, fish_region);
    }

    /// Both per-frame consumers on one tick source, scheduled in either order
    fn run_synced(overlay_first: bool) -> usize {
        let (mut scene, _) = populated_scene();
        let aquarium = Aquarium::new(AquariumConfig::default(), &scene, 8).unwrap();
        let mut layer = HeadlessOverlay::new();
        let overlay = OverlayManager::setup(&scene, &aquarium.registry, &mut layer);
        scene.take_changes();

        let scene = Rc::new(RefCell::new(scene));
        let aquarium = Rc::new(RefCell::new(aquarium));
        let overlay = Rc::new(RefCell::new(overlay));
        let layer = Rc::new(RefCell::new(layer));
        let source = Rc::new(ManualTickSource::new());

        let start_overlay = || {
            let (aquarium, overlay, layer) = (aquarium.clone(), overlay.clone(), layer.clone());
            run_loop(source.clone(), move |_| {
                overlay
                    .borrow_mut()
                    .frame(&aquarium.borrow().registry, &mut *layer.borrow_mut());
            })
        };
        let start_sim = || {
            let (aquarium, scene) = (aquarium.clone(), scene.clone());
            let mut sim = SimulationLoop::starting_at(0.0);
            run_loop(source.clone(), move |now| {
                sim.frame(&mut aquarium.borrow_mut(), &mut *scene.borrow_mut(), now);
            })
        };
        let _handles = if overlay_first {
            (start_overlay(), start_sim())
        } else {
            let sim = start_sim();
            (start_overlay(), sim)
        };

        let mut max_skew = 0;
        let mut history: Vec<BTreeMap<NodeId, Rect>> = Vec::new();
        for i in 1..=300 {
            source.fire(i as f64 * 16.0);

            let aquarium = aquarium.borrow();
            let current: BTreeMap<NodeId, Rect> = aquarium
                .registry
                .iter()
                .filter_map(|f| f.rendered.map(|t| (f.node, Rect { pos: t.anchor, size: t.size })))
                .collect();
            history.push(current);
            if i < 2 {
                // Overlay may have run before any fish was drawn
                continue;
            }

            for region in overlay.borrow().regions().filter(|r| r.animated) {
                let skew = history
                    .iter()
                    .rev()
                    .position(|frame| frame.get(&region.bound) == Some(&region.base))
                    .expect("region matches no recent transform");
                max_skew = max_skew.max(skew);
            }
        }
        max_skew
    }

    #[test]
    fn test_overlay_tracks_within_one_tick() {
        assert_eq!(run_synced(false), 0);
        assert!(run_synced(true) <= 1);
    }
}

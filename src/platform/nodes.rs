//! Node identity for hosts that observe a live document
//!
//! A host element keeps its [`NodeId`] for life, even across a detach and
//! re-attach. `NodeTable` maps ids back to elements and turns raw child-list
//! notifications into [`SceneChange`] batches. An id is released only once
//! its element has really left the container, so a node moved within the
//! container stays reachable.

use std::collections::BTreeMap;

use super::{NodeId, SceneChange};

/// What a host element must expose to be tracked
pub trait TrackedElement: Clone {
    /// Id previously stored on the element, if any
    fn stored_id(&self) -> Option<NodeId>;

    /// Store `id` on the element and do any first-time setup.
    /// Returns false if the element could not be adopted.
    fn adopt(&self, id: NodeId) -> bool;

    /// Fish or tank-floor decoration; other children are ignored
    fn is_trackable(&self) -> bool;

    /// Currently a direct child of the scene container
    fn is_attached(&self) -> bool;
}

/// One child-list notification, in delivery order
#[derive(Debug, Clone)]
pub enum ObservedChild<E> {
    Added(E),
    Removed(E),
}

#[derive(Debug)]
pub struct NodeTable<E> {
    nodes: BTreeMap<NodeId, E>,
    next_id: u32,
}

impl<E> Default for NodeTable<E> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<E: TrackedElement> NodeTable<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `element` to its id, assigning one on first sight. Re-attached
    /// elements get their old id back.
    pub fn track(&mut self, element: &E) -> Option<NodeId> {
        if !element.is_trackable() {
            return None;
        }
        let id = match element.stored_id() {
            Some(id) => id,
            None => {
                let id = NodeId(self.next_id);
                if !element.adopt(id) {
                    return None;
                }
                self.next_id += 1;
                id
            }
        };
        self.nodes.insert(id, element.clone());
        Some(id)
    }

    /// Translate one notification batch. Removals are reported for every
    /// known element; afterwards only elements that are no longer attached
    /// are released.
    pub fn translate(&mut self, batch: Vec<ObservedChild<E>>) -> Vec<SceneChange> {
        let mut changes = Vec::new();
        let mut departed = Vec::new();
        for observed in batch {
            match observed {
                ObservedChild::Added(element) => {
                    if let Some(id) = self.track(&element) {
                        changes.push(SceneChange::Inserted(id));
                    }
                }
                ObservedChild::Removed(element) => {
                    if let Some(id) = element.stored_id() {
                        changes.push(SceneChange::Removed(id));
                        departed.push(id);
                    }
                }
            }
        }

        for id in departed {
            if self.nodes.get(&id).is_some_and(|e| !e.is_attached()) {
                self.nodes.remove(&id);
            }
        }
        changes
    }

    pub fn get(&self, id: NodeId) -> Option<&E> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::overlay::OverlayManager;
    use crate::platform::headless::HeadlessOverlay;
    use crate::platform::{NodeInfo, SceneHost};
    use crate::settings::AquariumConfig;
    use crate::sim::{Aquarium, SceneWatcher, SimulationLoop, Transform};
    use crate::{Bounds, Rect};
    use glam::Vec2;

    #[derive(Debug, Default)]
    struct Element {
        id: Cell<Option<NodeId>>,
        fish: bool,
        attached: Cell<bool>,
        writes: Cell<usize>,
    }

    type El = Rc<Element>;

    impl TrackedElement for El {
        fn stored_id(&self) -> Option<NodeId> {
            self.id.get()
        }

        fn adopt(&self, id: NodeId) -> bool {
            self.id.set(Some(id));
            true
        }

        fn is_trackable(&self) -> bool {
            self.fish
        }

        fn is_attached(&self) -> bool {
            self.attached.get()
        }
    }

    fn fish() -> El {
        Rc::new(Element {
            fish: true,
            attached: Cell::new(true),
            ..Default::default()
        })
    }

    /// Minimal scene over a node table, the way a DOM host uses one
    struct TableScene {
        table: NodeTable<El>,
    }

    impl SceneHost for TableScene {
        fn container_bounds(&self) -> Option<Bounds> {
            Some(Bounds::new(800.0, 600.0))
        }

        fn children(&self) -> Vec<NodeId> {
            self.table
                .nodes
                .iter()
                .filter(|(_, e)| e.is_attached())
                .map(|(id, _)| *id)
                .collect()
        }

        fn describe(&self, node: NodeId) -> Option<NodeInfo> {
            self.table
                .get(node)
                .map(|_| NodeInfo::fish("fish_goldfish.png", false))
        }

        fn node_size(&self, node: NodeId) -> Vec2 {
            if self.table.contains(node) { Vec2::new(60.0, 40.0) } else { Vec2::ZERO }
        }

        fn layout_rect(&self, node: NodeId) -> Option<Rect> {
            self.table.get(node).map(|_| Rect::new(0.0, 0.0, 60.0, 40.0))
        }

        fn write_transform(&mut self, node: NodeId, _transform: &Transform) {
            if let Some(e) = self.table.get(node) {
                e.writes.set(e.writes.get() + 1);
            }
        }

        fn write_sway(&mut self, _node: NodeId, _degrees: f32) {}

        fn set_facing(&mut self, _node: NodeId, _direction: crate::sim::Direction) {}

        fn set_depth(&mut self, _node: NodeId, _depth: i32) {}
    }

    struct Tank {
        scene: TableScene,
        tank: Aquarium,
        layer: HeadlessOverlay,
        overlay: OverlayManager,
        watcher: SceneWatcher,
        sim: SimulationLoop,
    }

    impl Tank {
        fn with(elements: &[El]) -> Self {
            let mut table = NodeTable::new();
            for e in elements {
                table.track(e);
            }
            let scene = TableScene { table };
            let tank = Aquarium::new(AquariumConfig::default(), &scene, 5).unwrap();
            let mut layer = HeadlessOverlay::new();
            let overlay = OverlayManager::setup(&scene, &tank.registry, &mut layer);
            Self {
                scene,
                tank,
                layer,
                overlay,
                watcher: SceneWatcher::new(),
                sim: SimulationLoop::starting_at(0.0),
            }
        }

        fn deliver(&mut self, batch: Vec<ObservedChild<El>>) {
            let changes = self.scene.table.translate(batch);
            let membership = self.watcher.apply(&changes, &mut self.tank, &self.scene);
            self.overlay
                .apply_membership(&membership, &self.scene, &self.tank.registry, &mut self.layer);
        }

        fn frame(&mut self, now: f64) {
            self.sim.frame(&mut self.tank, &mut self.scene, now);
            self.overlay.frame(&self.tank.registry, &mut self.layer);
        }

        fn assert_in_sync(&self) {
            assert_eq!(self.overlay.animated_count(), self.tank.registry.len());
            for fish in self.tank.registry.iter() {
                assert!(self.scene.table.contains(fish.node));
            }
        }
    }

    #[test]
    fn test_ids_are_stable_and_non_fish_ignored() {
        let mut table = NodeTable::new();
        let a = fish();
        let rock: El = Rc::new(Element::default());

        let id = table.track(&a).unwrap();
        assert_eq!(table.track(&a), Some(id));
        assert_eq!(table.track(&rock), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_move_within_one_batch_keeps_node() {
        let a = fish();
        let mut t = Tank::with(&[a.clone()]);
        let id = a.stored_id().unwrap();
        t.frame(16.0);

        // Re-append: removed and added again in the same batch, still attached
        t.deliver(vec![ObservedChild::Removed(a.clone()), ObservedChild::Added(a.clone())]);

        assert!(t.scene.table.contains(id));
        assert!(t.tank.registry.contains(id));
        t.assert_in_sync();

        let before = a.writes.get();
        t.frame(32.0);
        assert_eq!(a.writes.get(), before + 1);
    }

    #[test]
    fn test_reinsert_in_later_batch_is_animated_again() {
        let a = fish();
        let mut t = Tank::with(&[a.clone()]);
        let id = a.stored_id().unwrap();

        a.attached.set(false);
        t.deliver(vec![ObservedChild::Removed(a.clone())]);
        assert!(!t.scene.table.contains(id));
        assert!(t.tank.registry.is_empty());
        t.assert_in_sync();

        a.attached.set(true);
        t.deliver(vec![ObservedChild::Added(a.clone())]);
        assert!(t.scene.table.contains(id));
        assert!(t.tank.registry.contains(id));
        t.assert_in_sync();

        t.frame(16.0);
        assert_eq!(a.writes.get(), 1);
    }

    #[test]
    fn test_added_then_removed_in_one_batch_is_released() {
        let mut t = Tank::with(&[]);
        let a = fish();
        a.attached.set(false);
        t.deliver(vec![ObservedChild::Added(a.clone()), ObservedChild::Removed(a.clone())]);

        assert!(t.scene.table.is_empty());
        assert!(t.tank.registry.is_empty());
        t.assert_in_sync();
    }
}

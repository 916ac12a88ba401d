//! Keeps the registry in step with fish added or removed after setup
//!
//! The host delivers batches of [`SceneChange`] for the container's direct
//! children (a mutation observer on the web). Non-fish nodes are ignored.

use super::state::Aquarium;
use crate::platform::{NodeId, SceneChange, SceneHost};

/// Registry membership change that actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Joined(NodeId),
    Left(NodeId),
}

#[derive(Debug, Default)]
pub struct SceneWatcher;

impl SceneWatcher {
    pub fn new() -> Self {
        Self
    }

    /// Apply one notification batch. Returns only the changes that altered
    /// membership: re-inserting a known fish or removing an unknown node
    /// reports nothing.
    pub fn apply<S: SceneHost + ?Sized>(
        &self,
        changes: &[SceneChange],
        aquarium: &mut Aquarium,
        scene: &S,
    ) -> Vec<Membership> {
        let mut out = Vec::new();
        for change in changes {
            match *change {
                SceneChange::Inserted(node) => {
                    if !aquarium.registry.contains(node) && aquarium.add_entity(node, scene) {
                        out.push(Membership::Joined(node));
                    }
                }
                SceneChange::Removed(node) => {
                    if aquarium.remove_entity(node) {
                        out.push(Membership::Left(node));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NodeInfo;
    use crate::platform::headless::HeadlessScene;
    use crate::settings::AquariumConfig;
    use crate::Rect;

    fn empty_tank() -> (HeadlessScene, Aquarium) {
        let scene = HeadlessScene::new(800.0, 600.0);
        let aquarium = Aquarium::new(AquariumConfig::default(), &scene, 17).unwrap();
        (scene, aquarium)
    }

    #[test]
    fn test_insertion_adds_one_record_in_bounds() {
        let (mut scene, mut aquarium) = empty_tank();
        let node = scene.insert(
            NodeInfo::fish("fish_yellow_tang.png", false),
            Rect::new(0.0, 0.0, 70.0, 45.0),
        );

        let changes = scene.take_changes();
        let joined = SceneWatcher::new().apply(&changes, &mut aquarium, &scene);

        assert_eq!(joined, vec![Membership::Joined(node)]);
        assert_eq!(aquarium.registry.len(), 1);
        let fish = aquarium.registry.get(node).unwrap();
        assert!(fish.x >= 0.0 && fish.x <= 800.0);
        assert!(fish.base_y >= 0.2 * 600.0 && fish.base_y <= 0.8 * 600.0);
    }

    #[test]
    fn test_repeated_insertion_is_ignored() {
        let (mut scene, mut aquarium) = empty_tank();
        let node = scene.insert(
            NodeInfo::fish("fish_goldfish.png", false),
            Rect::new(0.0, 0.0, 60.0, 40.0),
        );
        let watcher = SceneWatcher::new();
        let changes = scene.take_changes();
        watcher.apply(&changes, &mut aquarium, &scene);
        let again = watcher.apply(&[SceneChange::Inserted(node)], &mut aquarium, &scene);

        assert!(again.is_empty());
        assert_eq!(aquarium.registry.len(), 1);
    }

    #[test]
    fn test_removal_drops_record() {
        let (mut scene, mut aquarium) = empty_tank();
        let node = scene.insert(
            NodeInfo::fish("fish_goldfish.png", false),
            Rect::new(0.0, 0.0, 60.0, 40.0),
        );
        let watcher = SceneWatcher::new();
        let changes = scene.take_changes();
        watcher.apply(&changes, &mut aquarium, &scene);

        scene.remove(node);
        let changes = scene.take_changes();
        let left = watcher.apply(&changes, &mut aquarium, &scene);

        assert_eq!(left, vec![Membership::Left(node)]);
        assert!(aquarium.registry.is_empty());
    }

    #[test]
    fn test_non_fish_nodes_ignored() {
        let (mut scene, mut aquarium) = empty_tank();
        scene.insert(
            NodeInfo::bottom_object("bottom_shell.png"),
            Rect::new(0.0, 0.0, 60.0, 40.0),
        );
        let changes = scene.take_changes();
        let out = SceneWatcher::new().apply(&changes, &mut aquarium, &scene);
        assert!(out.is_empty());
        assert!(aquarium.registry.is_empty());
    }

    #[test]
    fn test_insert_then_remove_in_same_batch() {
        let (mut scene, mut aquarium) = empty_tank();
        let node = scene.insert(
            NodeInfo::fish("fish_clown.png", false),
            Rect::new(0.0, 0.0, 60.0, 40.0),
        );
        scene.remove(node);
        let changes = scene.take_changes();
        let out = SceneWatcher::new().apply(&changes, &mut aquarium, &scene);

        // The node is already gone when the batch arrives, so describe() fails
        assert!(out.is_empty());
        assert!(aquarium.registry.is_empty());
    }
}

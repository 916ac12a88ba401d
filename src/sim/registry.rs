//! Registry of live fish, keyed by scene node

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::state::Fish;
use crate::platform::{NodeId, NodeInfo};
use crate::settings::AquariumConfig;
use crate::Bounds;

/// Live fish records. Membership only changes through `add`/`remove`;
/// iteration order carries no meaning.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    fish: BTreeMap<NodeId, Fish>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for `node` unless one exists. Returns true if added.
    pub fn add(
        &mut self,
        node: NodeId,
        info: &NodeInfo,
        size: Vec2,
        bounds: Bounds,
        config: &AquariumConfig,
        rng: &mut impl Rng,
    ) -> bool {
        if self.fish.contains_key(&node) {
            return false;
        }
        let fish = Fish::spawn(node, info, size, bounds, config, rng);
        self.fish.insert(node, fish);
        true
    }

    /// Returns true if a record was removed
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.fish.remove(&node).is_some()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Fish)) {
        for fish in self.fish.values() {
            f(fish);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fish> {
        self.fish.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Fish> {
        self.fish.values_mut()
    }

    pub fn get(&self, node: NodeId) -> Option<&Fish> {
        self.fish.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Fish> {
        self.fish.get_mut(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.fish.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.fish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (EntityRegistry, Bounds, AquariumConfig, Pcg32) {
        (
            EntityRegistry::new(),
            Bounds::new(800.0, 600.0),
            AquariumConfig::default(),
            Pcg32::seed_from_u64(42),
        )
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut registry, bounds, config, mut rng) = setup();
        let info = NodeInfo::fish("fish_goldfish.png", false);

        assert!(registry.add(NodeId(1), &info, Vec2::ZERO, bounds, &config, &mut rng));
        let x = registry.get(NodeId(1)).unwrap().x;
        assert!(!registry.add(NodeId(1), &info, Vec2::ZERO, bounds, &config, &mut rng));

        assert_eq!(registry.len(), 1);
        // Second add didn't redraw the record
        assert_eq!(registry.get(NodeId(1)).unwrap().x, x);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut registry, bounds, config, mut rng) = setup();
        let info = NodeInfo::fish("fish_clown.png", true);
        registry.add(NodeId(3), &info, Vec2::ZERO, bounds, &config, &mut rng);

        assert!(registry.remove(NodeId(3)));
        assert!(!registry.remove(NodeId(3)));
        assert!(!registry.remove(NodeId(99)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_for_each_visits_every_record() {
        let (mut registry, bounds, config, mut rng) = setup();
        let info = NodeInfo::fish("fish_red_beta.png", false);
        for i in 0..5 {
            registry.add(NodeId(i), &info, Vec2::ZERO, bounds, &config, &mut rng);
        }

        let mut seen = Vec::new();
        registry.for_each(|f| seen.push(f.node));
        seen.sort();
        assert_eq!(seen, (0..5).map(NodeId).collect::<Vec<_>>());
    }
}

//! In-memory host for tests and the native demo
//!
//! `HeadlessScene` keeps node state in maps and queues structural changes the
//! way a mutation observer would; `ManualTickSource` only fires when told to.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use glam::Vec2;

use super::{
    FrameCallback, NodeId, NodeInfo, OverlayLayer, SceneChange, SceneHost, TickHandle, TickSource,
};
use crate::overlay::Adjustment;
use crate::sim::{Direction, Transform};
use crate::{Bounds, Rect};

/// A node in the headless scene
#[derive(Debug, Clone)]
pub struct HeadlessNode {
    pub info: NodeInfo,
    pub size: Vec2,
    pub rect: Rect,
    pub transform: Option<Transform>,
    pub sway: Option<f32>,
    pub depth: Option<i32>,
}

#[derive(Debug, Default)]
pub struct HeadlessScene {
    bounds: Option<Bounds>,
    order: Vec<NodeId>,
    nodes: BTreeMap<NodeId, HeadlessNode>,
    changes: Vec<SceneChange>,
    next_id: u32,
    /// Number of transform writes so far
    pub transform_writes: usize,
}

impl HeadlessScene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Some(Bounds::new(width, height)),
            ..Default::default()
        }
    }

    /// Scene whose container is missing
    pub fn without_container() -> Self {
        Self::default()
    }

    /// Append a child; queues an insertion notification
    pub fn insert(&mut self, info: NodeInfo, rect: Rect) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let depth = info.depth;
        self.nodes.insert(
            id,
            HeadlessNode {
                info,
                size: rect.size,
                rect,
                transform: None,
                sway: None,
                depth,
            },
        );
        self.order.push(id);
        self.changes.push(SceneChange::Inserted(id));
        id
    }

    /// Detach a child; queues a removal notification
    pub fn remove(&mut self, node: NodeId) -> bool {
        if self.nodes.remove(&node).is_none() {
            return false;
        }
        self.order.retain(|n| *n != node);
        self.changes.push(SceneChange::Removed(node));
        true
    }

    /// Simulate an image finishing its load
    pub fn set_size(&mut self, node: NodeId, size: Vec2) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.size = size;
            n.rect.size = size;
        }
    }

    /// Simulate a page reflow moving a static node
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
            n.size = rect.size;
        }
    }

    pub fn node(&self, node: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(&node)
    }

    /// Pending notifications since the last drain
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}

impl SceneHost for HeadlessScene {
    fn container_bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn children(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    fn describe(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.get(&node).map(|n| n.info.clone())
    }

    fn node_size(&self, node: NodeId) -> Vec2 {
        self.nodes.get(&node).map(|n| n.size).unwrap_or(Vec2::ZERO)
    }

    fn layout_rect(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(&node).map(|n| n.rect)
    }

    fn write_transform(&mut self, node: NodeId, transform: &Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = Some(*transform);
            self.transform_writes += 1;
        }
    }

    fn write_sway(&mut self, node: NodeId, degrees: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.sway = Some(degrees);
        }
    }

    fn set_facing(&mut self, node: NodeId, direction: Direction) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.info.facing_left = direction == Direction::Left;
        }
    }

    fn set_depth(&mut self, node: NodeId, depth: i32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.depth = Some(depth);
        }
    }
}

/// A region node in the headless overlay layer
#[derive(Debug, Clone, Default)]
pub struct HeadlessRegion {
    pub base: Rect,
    pub adjustment: Option<Adjustment>,
    pub active: bool,
    pub placements: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    pub regions: BTreeMap<NodeId, HeadlessRegion>,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self, bound: NodeId) -> Option<&HeadlessRegion> {
        self.regions.get(&bound)
    }
}

impl OverlayLayer for HeadlessOverlay {
    fn create_region(&mut self, bound: NodeId) {
        self.regions.entry(bound).or_default();
    }

    fn remove_region(&mut self, bound: NodeId) {
        self.regions.remove(&bound);
    }

    fn place_region(&mut self, bound: NodeId, base: &Rect, adjustment: &Adjustment) {
        if let Some(r) = self.regions.get_mut(&bound) {
            r.base = *base;
            r.adjustment = Some(*adjustment);
            r.placements += 1;
        }
    }

    fn set_active(&mut self, bound: NodeId, active: bool) {
        if let Some(r) = self.regions.get_mut(&bound) {
            r.active = active;
        }
    }
}

/// Tick source driven by hand: each `fire` is one refresh opportunity
#[derive(Default)]
pub struct ManualTickSource {
    queue: RefCell<Vec<(TickHandle, FrameCallback)>>,
    next: Cell<u64>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback scheduled before this call, in scheduling order.
    /// Callbacks scheduled while firing wait for the next opportunity.
    pub fn fire(&self, now: f64) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let count = batch.len();
        for (_, callback) in batch {
            callback(now);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl TickSource for ManualTickSource {
    fn schedule(&self, callback: FrameCallback) -> TickHandle {
        let handle = TickHandle(self.next.get());
        self.next.set(handle.0 + 1);
        self.queue.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel(&self, handle: TickHandle) {
        self.queue.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

//! Platform abstraction layer
//!
//! The simulation never touches the page directly. It talks to three host
//! capabilities:
//! - [`SceneHost`]: reads scene nodes and writes their transforms
//! - [`OverlayLayer`]: owns the selection region nodes
//! - [`TickSource`]: one callback per display refresh
//!
//! The browser implements these in `main.rs`; [`headless`] provides in-memory
//! versions for tests and the native demo. [`nodes`] keeps host element ids
//! stable across re-insertion.

pub mod headless;
pub mod nodes;

pub use nodes::{NodeTable, ObservedChild, TrackedElement};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::overlay::Adjustment;
use crate::sim::{Direction, Transform};
use crate::{Bounds, Rect};

/// Host-assigned identity of a scene node (registry key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Which part of the scene a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Swimming entity, animated by the simulation
    Fish,
    /// Static decoration on the tank floor
    BottomObject,
    Other,
}

/// What the host knows about a node when it first shows up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub category: NodeCategory,
    /// Asset identifier (image source), used for kind classification
    pub src: String,
    /// Node carries the "left" facing flag
    pub facing_left: bool,
    /// Stacking layer declared by the page, if any
    pub depth: Option<i32>,
}

impl NodeInfo {
    pub fn fish(src: impl Into<String>, facing_left: bool) -> Self {
        Self {
            category: NodeCategory::Fish,
            src: src.into(),
            facing_left,
            depth: None,
        }
    }

    pub fn bottom_object(src: impl Into<String>) -> Self {
        Self {
            category: NodeCategory::BottomObject,
            src: src.into(),
            facing_left: false,
            depth: None,
        }
    }
}

/// Structural change to the scene container's direct children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Inserted(NodeId),
    Removed(NodeId),
}

/// Scene container as seen by the simulation
pub trait SceneHost {
    /// Content box of the container; `None` if it doesn't exist
    fn container_bounds(&self) -> Option<Bounds>;

    /// Current direct children, in document order
    fn children(&self) -> Vec<NodeId>;

    fn describe(&self, node: NodeId) -> Option<NodeInfo>;

    /// Laid-out size; zero while the node has no layout box yet
    fn node_size(&self, node: NodeId) -> Vec2;

    /// Layout rectangle relative to the container (ignores transforms)
    fn layout_rect(&self, node: NodeId) -> Option<Rect>;

    fn write_transform(&mut self, node: NodeId, transform: &Transform);

    /// Rotate a decoration by `degrees`
    fn write_sway(&mut self, node: NodeId, degrees: f32);

    fn set_facing(&mut self, node: NodeId, direction: Direction);

    fn set_depth(&mut self, node: NodeId, depth: i32);
}

/// Layer that holds one selection region per tracked node
pub trait OverlayLayer {
    fn create_region(&mut self, bound: NodeId);

    fn remove_region(&mut self, bound: NodeId);

    /// Position the region at `base` and apply the per-kind adjustment on top
    fn place_region(&mut self, bound: NodeId, base: &Rect, adjustment: &Adjustment);

    fn set_active(&mut self, bound: NodeId, active: bool);
}

/// Handle to a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Callback receiving the high-resolution timestamp (ms)
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Display-synchronized scheduler: runs each callback once, at the next
/// refresh opportunity
pub trait TickSource {
    fn schedule(&self, callback: FrameCallback) -> TickHandle;

    fn cancel(&self, handle: TickHandle);
}

struct LoopState {
    running: Cell<bool>,
    pending: Cell<Option<TickHandle>>,
}

/// Stops a loop started with [`run_loop`]
pub struct LoopHandle {
    state: Rc<LoopState>,
    cancel: Box<dyn Fn(TickHandle)>,
}

impl LoopHandle {
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    pub fn stop(&self) {
        self.state.running.set(false);
        if let Some(handle) = self.state.pending.take() {
            (self.cancel)(handle);
        }
    }
}

/// Call `frame` on every opportunity until stopped. The loop re-arms itself
/// after each frame, so the frame body always completes before the next
/// opportunity is requested.
pub fn run_loop<S, F>(source: Rc<S>, frame: F) -> LoopHandle
where
    S: TickSource + ?Sized + 'static,
    F: FnMut(f64) + 'static,
{
    let state = Rc::new(LoopState {
        running: Cell::new(true),
        pending: Cell::new(None),
    });
    arm(source.clone(), Rc::new(RefCell::new(frame)), state.clone());

    LoopHandle {
        state,
        cancel: Box::new(move |handle| source.cancel(handle)),
    }
}

fn arm<S, F>(source: Rc<S>, frame: Rc<RefCell<F>>, state: Rc<LoopState>)
where
    S: TickSource + ?Sized + 'static,
    F: FnMut(f64) + 'static,
{
    let next_source = source.clone();
    let next_state = state.clone();
    let handle = source.schedule(Box::new(move |now| {
        next_state.pending.set(None);
        if !next_state.running.get() {
            return;
        }
        (frame.borrow_mut())(now);
        if next_state.running.get() {
            arm(next_source, frame, next_state);
        }
    }));
    state.pending.set(Some(handle));
}

#[cfg(test)]
mod tests {
    use super::headless::ManualTickSource;
    use super::*;

    #[test]
    fn test_run_loop_reschedules_each_frame() {
        let source = Rc::new(ManualTickSource::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handle = run_loop(source.clone(), move |now| sink.borrow_mut().push(now));

        assert_eq!(source.pending(), 1);
        source.fire(16.0);
        source.fire(32.0);
        source.fire(48.0);
        assert_eq!(*seen.borrow(), vec![16.0, 32.0, 48.0]);
        assert!(handle.is_running());
        assert_eq!(source.pending(), 1);
    }

    #[test]
    fn test_stop_cancels_pending_frame() {
        let source = Rc::new(ManualTickSource::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handle = run_loop(source.clone(), move |_| c.set(c.get() + 1));

        source.fire(16.0);
        handle.stop();
        assert_eq!(source.pending(), 0);
        source.fire(32.0);
        assert_eq!(count.get(), 1);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_stop_from_inside_frame() {
        let source = Rc::new(ManualTickSource::new());
        let slot: Rc<RefCell<Option<LoopHandle>>> = Rc::new(RefCell::new(None));
        let inner = slot.clone();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handle = run_loop(source.clone(), move |_| {
            c.set(c.get() + 1);
            if let Some(h) = inner.borrow().as_ref() {
                h.stop();
            }
        });
        *slot.borrow_mut() = Some(handle);

        source.fire(16.0);
        source.fire(32.0);
        assert_eq!(count.get(), 1);
        assert_eq!(source.pending(), 0);
    }
}

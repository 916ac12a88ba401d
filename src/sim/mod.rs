//! Fish simulation module
//!
//! Everything that moves lives here. The module is host-agnostic:
//! - Time comes in as a timestamp per frame
//! - Randomness comes from the context's seeded RNG
//! - Scene access goes through `platform::SceneHost`

pub mod kind;
pub mod kinematics;
pub mod registry;
pub mod state;
pub mod tick;
pub mod watcher;

pub use kind::{Kind, Side};
pub use kinematics::{Step, respawn, step, target_y};
pub use registry::EntityRegistry;
pub use state::{Aquarium, Direction, Fish, Transform};
pub use tick::{FrameReport, SimulationLoop};
pub use watcher::{Membership, SceneWatcher};

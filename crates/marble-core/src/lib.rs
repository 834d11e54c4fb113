//! Marble Race Core Library
//!
//! Roster management, race state and the scene/physics engine behind the
//! marble race. Physics runs on `Rapier3D`; drawing and frame timing are
//! supplied by the host through [`RenderScene`] and [`FrameScheduler`].

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod marble;
pub mod physics;
pub mod race;
pub mod render;
pub mod roster;
pub mod scene;

#[cfg(test)]
mod test_utils;

pub use rapier3d::na;

pub use config::{ConfigError, RaceConfig};
pub use marble::{Color, Marble, MarblePatch, ParseColorError};
pub use physics::{BodyHandle, Motion, PHYSICS_DT, PhysicsWorld, RapierWorld, Vec3, default_gravity};
pub use race::{InvalidRaceState, RaceState, RaceStatus};
pub use render::{
    Camera, DirectionalLight, HeadlessScene, HeadlessSurface, Label, LabelId, Mesh, MeshId,
    MeshShape, RenderError, RenderScene, Viewport,
};
pub use roster::{MAX_MARBLES, MIN_MARBLES, Roster};
pub use scene::{
    FinishCallback, FrameScheduler, ManualFrames, MarbleBody, MarbleSnapshot, OrbitControls,
    SceneEngine, SceneError,
};

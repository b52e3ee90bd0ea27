//! Backend-agnostic scene layer for the Vantage renderer.
//!
//! Holds the camera (view/projection derivation, first-person navigation)
//! and the fixed render stage ordering. Nothing here depends on a GPU API;
//! the wgpu backend consumes these types.
//!
//! # Invariants
//! - The camera's cached matrices always reflect its current state: every
//!   mutator recomputes them before returning.
//! - Stage order is data (`RenderStage::ORDER`), not caller discipline.

mod camera;
mod stage;

pub use camera::{Camera, LOOK_SENSITIVITY, MOVE_SPEED, NavInput, PITCH_LIMIT_DEGREES};
pub use stage::RenderStage;

//! wgpu render backend for the Vantage renderer.
//!
//! Three drawable variants share one capability surface: a textured mesh,
//! camera-facing billboards over a single shared quad, and an inside-out
//! skybox cube sampled from a cubemap. The scene renderer submits them in
//! the fixed stage order (background, opaque, transparent) each frame.
//!
//! # Invariants
//! - GPU resources are owned by exactly one drawable and live between its
//!   `init` and `teardown`; teardown is idempotent.
//! - Drawing through an uninitialized drawable is rejected with an explicit
//!   error, never undefined behavior.
//! - Depth, blend, and cull state are baked into each drawable's pipeline;
//!   no draw can leak state into another.

mod billboard;
mod error;
mod mesh;
mod scene;
mod shaders;
mod skybox;
mod texture;

pub use billboard::{Billboard, BillboardRenderer, facing_rotation_degrees, instance_matrix};
pub use error::RenderError;
pub use mesh::MeshRenderer;
pub use scene::{Drawable, SceneRenderer};
pub use skybox::{SkyboxRenderer, strip_translation};
pub use texture::{CubemapTexture, Texture2d};

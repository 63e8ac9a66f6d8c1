//! wgpu render backend for the boxroll scene.
//!
//! Draws the rolling box and the floor cells as instanced cubes through the
//! fixed three-pass schedule: shadow depth from the light's view, the beauty
//! pass into an off-screen target sampling the shadow map, and a full-screen
//! post pass onto the surface.
//!
//! # Invariants
//! - The backend never mutates puzzle or scene state.
//! - Pass order comes from `boxroll_render::FrameSchedule`, not from here.
//! - Matrices are read through the scene's cached values at render time.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::SceneRenderer;

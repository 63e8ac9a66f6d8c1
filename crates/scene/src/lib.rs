//! Scene rigs with lazily recomputed matrices.
//!
//! # Invariants
//! - Cached matrices are invalidated by their upstream setters and recomputed
//!   on the next read, never eagerly per frame.
//! - Camera and light motion live outside the puzzle state machine.

pub mod cache;
pub mod camera;
pub mod light;

pub use cache::{Memo, TimeTagged};
pub use camera::OrbitCamera;
pub use light::LightRig;

//! Renderer-agnostic pass scheduling.
//!
//! # Invariants
//! - Pass order per frame is fixed: shadow depth, then beauty, then post.
//! - Every pushed render target is restored before frame end, on every path.
//! - Backends read frame inputs at pass execution time, after the update step.

mod schedule;
mod stack;

pub use schedule::{FramePasses, FrameSchedule, PassKind, TargetId};
pub use stack::TargetStack;

use glam::Mat4;

/// Everything a backend needs to draw one frame, sampled after the frame's
/// update step so every pass sees the same state.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Box transform, possibly mid-roll.
    pub box_xform: Mat4,
    /// Seconds since startup, the tag for time-memoized light matrices.
    pub time: f32,
    /// Post-processing effect flag (set on a loss).
    pub effect_on: bool,
}

pub fn crate_info() -> &'static str {
    "boxroll-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

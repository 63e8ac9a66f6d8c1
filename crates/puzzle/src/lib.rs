//! Puzzle core: authoritative box state, roll animation, win/lose rules.
//!
//! # Invariants
//! - The box transform equals `translation(position) * orientation` whenever
//!   no roll is animating.
//! - All state mutations flow through `request_roll`, `advance`, and `reset`.
//! - Win and map membership checks compare rounded grid cells, never floats.

pub mod level;
pub mod state;

pub use level::{Level, LevelError};
pub use state::{Outcome, Phase, Puzzle, DEFAULT_ROLL_SPEED};

//! Shared types for the boxroll puzzle: grid cells, roll directions, box poses.
//!
//! # Invariants
//! - Grid comparisons go through `GridCell`, never raw floats.
//! - A `BoxPose` is grid-aligned between rolls; its transform is derived.

pub mod types;

pub use types::{BoxPose, Direction, DirectionParseError, GridCell};

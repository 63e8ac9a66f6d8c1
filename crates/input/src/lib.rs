//! Input actions: keyboard, pointer, and wheel events mapped to a shared
//! vocabulary.
//!
//! # Invariants
//! - The puzzle core and camera consume actions, never raw window events.
//! - The same action set serves the desktop and headless front ends.

pub mod action;

pub use action::{roll_key, Action};

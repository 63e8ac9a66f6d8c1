use boxroll_common::Direction;
use glam::Vec2;

/// A high-level action any front end (desktop window, headless replay) can
/// produce. The puzzle and scene layers consume these, never raw events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Roll the box one cell in a cardinal direction.
    Roll(Direction),
    /// Orbit the camera by a pointer drag delta.
    Orbit(Vec2),
    /// Zoom the camera by signed wheel steps.
    Zoom(f32),
    /// Nudge the key-held camera pan rate (±1 on press/release).
    PanRate(f32),
    /// Nudge the key-held camera tilt rate (±1 on press/release).
    TiltRate(f32),
    /// Toggle the post-processing effect.
    ToggleEffect,
    /// Restore the puzzle's start state.
    Reset,
    /// No-op (unbound input).
    Noop,
}

/// Movement-key table: w/s roll along ±Z, a/d along ±X.
pub fn roll_key(key: char) -> Option<Direction> {
    match key {
        'w' => Some(Direction::North),
        's' => Some(Direction::South),
        'a' => Some(Direction::East),
        'd' => Some(Direction::West),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_directions() {
        assert_eq!(roll_key('w'), Some(Direction::North));
        assert_eq!(roll_key('s'), Some(Direction::South));
        assert_eq!(roll_key('a'), Some(Direction::East));
        assert_eq!(roll_key('d'), Some(Direction::West));
        assert_eq!(roll_key('q'), None);
    }

    #[test]
    fn action_roll_is_constructible() {
        let a = Action::Roll(Direction::North);
        assert!(matches!(a, Action::Roll(Direction::North)));
    }

    #[test]
    fn orbit_carries_drag_delta() {
        let a = Action::Orbit(Vec2::new(3.0, -2.0));
        assert!(matches!(a, Action::Orbit(d) if d.x == 3.0));
    }
}

use boxroll_common::{BoxPose, Direction, GridCell};
use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

use crate::Level;

/// Roll progress gained per second. A full quarter turn takes ~286 ms.
pub const DEFAULT_ROLL_SPEED: f32 = 3.5;

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At rest on a valid cell; roll requests are accepted.
    Idle,
    /// A quarter-turn roll is animating; further requests are ignored.
    Rolling,
    /// The box reached the win cell. Terminal.
    Won,
}

/// Result of a committed roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Landed on a valid cell.
    Moved,
    /// Landed exactly on the win cell.
    Won,
    /// Landed outside the map. The pose stays committed; the front end is
    /// expected to show the effect and reset after a delay.
    OffMap,
}

/// An in-flight quarter-turn roll.
#[derive(Debug, Clone, Copy)]
struct Roll {
    direction: Direction,
    progress: f32,
}

/// The box motion state machine.
///
/// Tracks the box's rest pose and an optional in-flight roll. `advance`
/// interpolates the transform while rolling and, on completion, commits the
/// new rest pose and evaluates the landing against the level.
#[derive(Debug, Clone)]
pub struct Puzzle {
    level: Level,
    pose: BoxPose,
    roll: Option<Roll>,
    won: bool,
    roll_speed: f32,
    xform: Mat4,
}

impl Puzzle {
    pub fn new(level: Level) -> Self {
        let pose = BoxPose::at(level.start);
        Self {
            level,
            pose,
            roll: None,
            won: false,
            roll_speed: DEFAULT_ROLL_SPEED,
            xform: pose.xform(),
        }
    }

    pub fn set_roll_speed(&mut self, speed: f32) {
        self.roll_speed = speed;
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn phase(&self) -> Phase {
        if self.won {
            Phase::Won
        } else if self.roll.is_some() {
            Phase::Rolling
        } else {
            Phase::Idle
        }
    }

    /// The rest pose. Only meaningful between rolls.
    pub fn pose(&self) -> BoxPose {
        self.pose
    }

    /// The grid cell of the rest position.
    pub fn cell(&self) -> GridCell {
        self.pose.cell()
    }

    /// The transform to draw the box with, possibly mid-animation.
    pub fn current_xform(&self) -> Mat4 {
        self.xform
    }

    /// Start a roll. Accepted only while idle; a request during a roll or
    /// after winning is silently ignored (debouncing, not an error).
    /// Returns whether the request was accepted.
    pub fn request_roll(&mut self, direction: Direction) -> bool {
        if self.won || self.roll.is_some() {
            return false;
        }
        tracing::debug!(?direction, cell = ?self.cell(), "roll requested");
        self.roll = Some(Roll {
            direction,
            progress: 0.0,
        });
        true
    }

    /// Advance the roll animation by `dt` seconds.
    ///
    /// Returns an outcome only when a roll commits this step. While the roll
    /// is in flight only the combined transform changes; the rest pose is
    /// untouched until commit.
    pub fn advance(&mut self, dt: f32) -> Option<Outcome> {
        let Some(mut roll) = self.roll else {
            return None;
        };
        if self.won {
            return None;
        }

        roll.progress += dt * self.roll_speed;
        let axis = roll.direction.roll_axis();

        if roll.progress >= 1.0 {
            self.pose.orientation =
                Mat4::from_axis_angle(axis, FRAC_PI_2) * self.pose.orientation;
            self.pose.position += roll.direction.unit() * self.level.cell_size;
            self.xform = self.pose.xform();
            self.roll = None;
            return Some(self.evaluate_landing());
        }

        // Pivot around the bottom edge shared with the target cell: move the
        // edge to the origin, apply the partial rotation, move back, then
        // place the box at its rest position.
        let pivot = (Vec3::Y - roll.direction.unit()) * (self.level.cell_size * 0.5);
        let rotation = Mat4::from_axis_angle(axis, FRAC_PI_2 * roll.progress);
        self.xform = Mat4::from_translation(self.pose.position - pivot)
            * rotation
            * Mat4::from_translation(pivot)
            * self.pose.orientation;
        self.roll = Some(roll);
        None
    }

    fn evaluate_landing(&mut self) -> Outcome {
        let cell = self.pose.cell();
        if cell == self.level.win_cell() {
            tracing::info!(?cell, "box reached the win cell");
            self.won = true;
            Outcome::Won
        } else if !self.level.contains(cell) {
            tracing::info!(?cell, "box rolled off the map");
            Outcome::OffMap
        } else {
            tracing::debug!(?cell, "box landed");
            Outcome::Moved
        }
    }

    /// Restore the start pose and idle phase (the full reset after a loss).
    pub fn reset(&mut self) {
        tracing::info!("puzzle reset");
        self.pose = BoxPose::at(self.level.start);
        self.xform = self.pose.xform();
        self.roll = None;
        self.won = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll_to_completion(puzzle: &mut Puzzle, direction: Direction) -> Option<Outcome> {
        assert!(puzzle.request_roll(direction));
        let mut outcome = None;
        for _ in 0..100 {
            outcome = puzzle.advance(0.016);
            if outcome.is_some() {
                break;
            }
        }
        outcome
    }

    #[test]
    fn starts_idle_at_level_start() {
        let puzzle = Puzzle::new(Level::default());
        assert_eq!(puzzle.phase(), Phase::Idle);
        assert_eq!(puzzle.cell(), GridCell::new(0, 0, 0));
        assert_eq!(puzzle.current_xform(), Mat4::IDENTITY);
    }

    #[test]
    fn completed_roll_moves_one_cell() {
        let mut puzzle = Puzzle::new(Level::default());
        let outcome = roll_to_completion(&mut puzzle, Direction::North);
        assert_eq!(outcome, Some(Outcome::Moved));
        assert_eq!(puzzle.phase(), Phase::Idle);
        assert_eq!(puzzle.cell(), GridCell::new(0, 0, 40));
    }

    #[test]
    fn rest_invariant_holds_after_commit() {
        let mut puzzle = Puzzle::new(Level::default());
        roll_to_completion(&mut puzzle, Direction::North);
        let pose = puzzle.pose();
        assert!(puzzle
            .current_xform()
            .abs_diff_eq(pose.xform(), 1e-6));
    }

    #[test]
    fn request_while_rolling_is_ignored() {
        let mut puzzle = Puzzle::new(Level::default());
        assert!(puzzle.request_roll(Direction::North));
        puzzle.advance(0.05);
        let mid_xform = puzzle.current_xform();
        // A second request must not change direction or reset progress.
        assert!(!puzzle.request_roll(Direction::East));
        assert_eq!(puzzle.phase(), Phase::Rolling);
        assert_eq!(puzzle.current_xform(), mid_xform);
        let outcome = loop {
            if let Some(o) = puzzle.advance(0.016) {
                break o;
            }
        };
        assert_eq!(outcome, Outcome::Moved);
        assert_eq!(puzzle.cell(), GridCell::new(0, 0, 40));
    }

    #[test]
    fn mid_roll_keeps_rest_pose() {
        let mut puzzle = Puzzle::new(Level::default());
        let rest = puzzle.pose();
        puzzle.request_roll(Direction::North);
        puzzle.advance(0.05);
        assert_eq!(puzzle.pose(), rest);
        assert_ne!(puzzle.current_xform(), rest.xform());
    }

    #[test]
    fn four_rolls_about_one_axis_restore_orientation() {
        // Use a wide-open map so four norths stay on valid cells.
        let mut cells = Vec::new();
        for z in 0..6 {
            cells.push(Vec3::new(0.0, 0.0, z as f32 * 0.4));
        }
        let level = Level {
            cell_size: 0.4,
            start: Vec3::ZERO,
            win: Vec3::new(0.0, 0.0, 2.0),
            cells,
        };
        let mut puzzle = Puzzle::new(level);
        for _ in 0..4 {
            let outcome = roll_to_completion(&mut puzzle, Direction::North);
            assert_eq!(outcome, Some(Outcome::Moved));
        }
        assert!(puzzle.pose().orientation.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn win_cell_transitions_to_terminal_won() {
        let level = Level {
            win: Vec3::new(0.0, 0.0, 0.4),
            ..Level::default()
        };
        let mut puzzle = Puzzle::new(level);
        let outcome = roll_to_completion(&mut puzzle, Direction::North);
        assert_eq!(outcome, Some(Outcome::Won));
        assert_eq!(puzzle.phase(), Phase::Won);

        // Terminal: no further roll requests are accepted.
        let won_cell = puzzle.cell();
        assert!(!puzzle.request_roll(Direction::North));
        assert!(puzzle.advance(1.0).is_none());
        assert_eq!(puzzle.phase(), Phase::Won);
        assert_eq!(puzzle.cell(), won_cell);
    }

    #[test]
    fn off_map_landing_signals_loss_once_and_commits_pose() {
        let mut puzzle = Puzzle::new(Level::default());
        // East from the start leaves the map immediately.
        let outcome = roll_to_completion(&mut puzzle, Direction::East);
        assert_eq!(outcome, Some(Outcome::OffMap));
        // The invalid pose stays committed; the reset comes later from the
        // front end.
        assert_eq!(puzzle.phase(), Phase::Idle);
        assert_eq!(puzzle.cell(), GridCell::new(40, 0, 0));
        // No further outcome without a new roll.
        assert!(puzzle.advance(1.0).is_none());
    }

    #[test]
    fn reset_restores_start() {
        let mut puzzle = Puzzle::new(Level::default());
        roll_to_completion(&mut puzzle, Direction::East);
        puzzle.reset();
        assert_eq!(puzzle.phase(), Phase::Idle);
        assert_eq!(puzzle.cell(), GridCell::new(0, 0, 0));
        assert_eq!(puzzle.current_xform(), Mat4::IDENTITY);
        assert!(puzzle.request_roll(Direction::North));
    }

    #[test]
    fn sample_route_follows_map_cells() {
        // North ×3 then west walks map entries 0 → 1 → 2 → 3 → 4; one more
        // west reaches entry 5.
        let mut puzzle = Puzzle::new(Level::default());
        for _ in 0..3 {
            assert_eq!(
                roll_to_completion(&mut puzzle, Direction::North),
                Some(Outcome::Moved)
            );
        }
        assert_eq!(puzzle.cell(), GridCell::new(0, 0, 120));
        assert_eq!(
            roll_to_completion(&mut puzzle, Direction::West),
            Some(Outcome::Moved)
        );
        assert_eq!(puzzle.cell(), GridCell::new(-40, 0, 120));
        assert_eq!(puzzle.phase(), Phase::Idle);
        assert_eq!(
            roll_to_completion(&mut puzzle, Direction::West),
            Some(Outcome::Moved)
        );
        assert_eq!(puzzle.cell(), GridCell::new(-80, 0, 120));
    }

    #[test]
    fn winning_route_reaches_win_cell() {
        // n n n w w n n lands on the win cell [-0.8, 0, 2].
        let mut puzzle = Puzzle::new(Level::default());
        let route = [
            Direction::North,
            Direction::North,
            Direction::North,
            Direction::West,
            Direction::West,
            Direction::North,
            Direction::North,
        ];
        let mut last = None;
        for dir in route {
            last = roll_to_completion(&mut puzzle, dir);
        }
        assert_eq!(last, Some(Outcome::Won));
        assert_eq!(puzzle.cell(), GridCell::new(-80, 0, 200));
        assert_eq!(puzzle.phase(), Phase::Won);
    }

    #[test]
    fn progress_accumulates_across_small_steps() {
        let mut puzzle = Puzzle::new(Level::default());
        puzzle.request_roll(Direction::North);
        // 3.5/s means ~0.286 s per roll; 200 ms of small steps is not enough.
        for _ in 0..20 {
            assert!(puzzle.advance(0.01).is_none());
        }
        assert_eq!(puzzle.phase(), Phase::Rolling);
        // Another 200 ms finishes it.
        let mut outcome = None;
        for _ in 0..20 {
            outcome = puzzle.advance(0.01);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(Outcome::Moved));
    }
}

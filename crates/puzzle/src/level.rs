use boxroll_common::GridCell;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("cell size must be positive, got {0}")]
    BadCellSize(f32),
    #[error("level has no cells")]
    Empty,
    #[error("start cell {0:?} is not on the map")]
    StartOffMap(GridCell),
    #[error("win cell {0:?} is not on the map")]
    WinOffMap(GridCell),
}

/// A fixed map the box may roll across: valid cells, a win cell, and the
/// edge length of one cell (which is also the box size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub cell_size: f32,
    pub start: Vec3,
    pub win: Vec3,
    pub cells: Vec<Vec3>,
}

impl Default for Level {
    /// The built-in thirteen-cell map.
    fn default() -> Self {
        Self {
            cell_size: 0.4,
            start: Vec3::ZERO,
            win: Vec3::new(-0.8, 0.0, 2.0),
            cells: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.4),
                Vec3::new(0.0, 0.0, 0.8),
                Vec3::new(0.0, 0.0, 1.2),
                Vec3::new(-0.4, 0.0, 1.2),
                Vec3::new(-0.8, 0.0, 1.2),
                Vec3::new(-0.8, 0.0, 2.0),
                Vec3::new(-0.4, 0.0, 0.4),
                Vec3::new(-0.8, 0.0, 0.4),
                Vec3::new(-0.8, 0.0, 0.8),
                Vec3::new(-1.2, 0.0, 0.8),
                Vec3::new(-0.8, 0.0, 1.2),
                Vec3::new(-0.8, 0.0, 1.6),
            ],
        }
    }
}

impl Level {
    /// Load and validate a level from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse and validate a level from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, LevelError> {
        let level: Level = serde_yaml::from_str(text)?;
        level.validate()?;
        Ok(level)
    }

    /// Check structural validity: positive cell size, non-empty map, and
    /// start/win cells that are actually on it.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !(self.cell_size > 0.0) {
            return Err(LevelError::BadCellSize(self.cell_size));
        }
        if self.cells.is_empty() {
            return Err(LevelError::Empty);
        }
        let start = GridCell::from_world(self.start);
        if !self.contains(start) {
            return Err(LevelError::StartOffMap(start));
        }
        let win = self.win_cell();
        if !self.contains(win) {
            return Err(LevelError::WinOffMap(win));
        }
        Ok(())
    }

    /// Whether the rounded cell is a member of the map.
    pub fn contains(&self, cell: GridCell) -> bool {
        self.cells.iter().any(|c| GridCell::from_world(*c) == cell)
    }

    pub fn start_cell(&self) -> GridCell {
        GridCell::from_world(self.start)
    }

    pub fn win_cell(&self) -> GridCell {
        GridCell::from_world(self.win)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_valid() {
        let level = Level::default();
        assert!(level.validate().is_ok());
        assert_eq!(level.cells.len(), 13);
    }

    #[test]
    fn default_level_contains_win_and_start() {
        let level = Level::default();
        assert!(level.contains(level.start_cell()));
        assert!(level.contains(level.win_cell()));
        assert_eq!(level.win_cell(), GridCell::new(-80, 0, 200));
    }

    #[test]
    fn membership_uses_rounded_cells() {
        let level = Level::default();
        // Drifted float still lands on the cell it rounds to.
        let drifted = GridCell::from_world(Vec3::new(-0.40000004, 0.0, 1.1999999));
        assert!(level.contains(drifted));
        assert!(!level.contains(GridCell::new(200, 0, 200)));
    }

    #[test]
    fn yaml_round_trip() {
        let level = Level::default();
        let text = serde_yaml::to_string(&level).unwrap();
        let back = Level::from_yaml(&text).unwrap();
        assert_eq!(back.cells.len(), level.cells.len());
        assert_eq!(back.win_cell(), level.win_cell());
    }

    #[test]
    fn rejects_bad_cell_size() {
        let level = Level {
            cell_size: 0.0,
            ..Level::default()
        };
        assert!(matches!(level.validate(), Err(LevelError::BadCellSize(_))));
    }

    #[test]
    fn rejects_start_off_map() {
        let level = Level {
            start: Vec3::new(5.0, 0.0, 5.0),
            ..Level::default()
        };
        assert!(matches!(level.validate(), Err(LevelError::StartOffMap(_))));
    }

    #[test]
    fn rejects_win_off_map() {
        let level = Level {
            win: Vec3::new(5.0, 0.0, 5.0),
            ..Level::default()
        };
        assert!(matches!(level.validate(), Err(LevelError::WinOffMap(_))));
    }
}

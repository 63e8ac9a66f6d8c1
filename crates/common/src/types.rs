use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A grid coordinate in centi-units (world coordinate × 100, rounded).
///
/// Repeated matrix composition drifts the box position by tiny fractions;
/// comparing cells after rounding to two decimals absorbs that drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Round a world-space position to its grid cell.
    pub fn from_world(p: Vec3) -> Self {
        Self {
            x: round_centi(p.x),
            y: round_centi(p.y),
            z: round_centi(p.z),
        }
    }

    /// The canonical world-space position of this cell.
    pub fn to_world(self) -> Vec3 {
        Vec3::new(
            self.x as f32 / 100.0,
            self.y as f32 / 100.0,
            self.z as f32 / 100.0,
        )
    }
}

fn round_centi(v: f32) -> i32 {
    (v * 100.0).round() as i32
}

/// A cardinal roll direction on the grid.
///
/// North grows +Z to match the map layout; the WASD "w" key rolls north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Error from parsing a direction code.
#[derive(Debug, thiserror::Error)]
#[error("unknown direction code {0:?} (expected n, s, e, or w)")]
pub struct DirectionParseError(pub String);

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit vector of travel.
    pub fn unit(self) -> Vec3 {
        match self {
            Direction::North => Vec3::Z,
            Direction::South => Vec3::NEG_Z,
            Direction::East => Vec3::X,
            Direction::West => Vec3::NEG_X,
        }
    }

    /// The horizontal axis the box rotates around for this roll: the travel
    /// vector turned 90° about +Y.
    pub fn roll_axis(self) -> Vec3 {
        match self {
            Direction::North => Vec3::X,
            Direction::South => Vec3::NEG_X,
            Direction::East => Vec3::NEG_Z,
            Direction::West => Vec3::Z,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" | "north" => Ok(Direction::North),
            "s" | "south" => Ok(Direction::South),
            "e" | "east" => Ok(Direction::East),
            "w" | "west" => Ok(Direction::West),
            other => Err(DirectionParseError(other.to_string())),
        }
    }
}

/// The box's rest state: canonical position and orientation between rolls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPose {
    pub position: Vec3,
    pub orientation: Mat4,
}

impl Default for BoxPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Mat4::IDENTITY,
        }
    }
}

impl BoxPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            orientation: Mat4::IDENTITY,
        }
    }

    /// The composed rest transform: translation applied after orientation.
    pub fn xform(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.orientation
    }

    /// The grid cell this pose rests on.
    pub fn cell(&self) -> GridCell {
        GridCell::from_world(self.position)
    }
}

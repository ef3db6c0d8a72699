use crate::error::Error;
use crate::math;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Counting direction in frame coordinates, y grows downward.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Whether the step `prev -> curr` moves this way.
    #[inline]
    pub fn matches(&self, prev: &na::Point2<f32>, curr: &na::Point2<f32>) -> bool {
        match self {
            Direction::Down => curr.y > prev.y,
            Direction::Up => curr.y < prev.y,
            Direction::Right => curr.x > prev.x,
            Direction::Left => curr.x < prev.x,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Down
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(Error::UnknownDirection(other.to_string())),
        }
    }
}

/// Virtual line vehicles are counted on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CountingLine {
    pub start: na::Point2<f32>,
    pub end: na::Point2<f32>,
    pub direction: Direction,
}

impl CountingLine {
    pub fn new(start: na::Point2<f32>, end: na::Point2<f32>, direction: Direction) -> Self {
        Self {
            start,
            end,
            direction,
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        na::distance(&self.start, &self.end) <= f32::EPSILON
    }

    /// Geometric crossing of the step `prev -> curr`, ignoring direction.
    #[inline]
    pub fn intersects(&self, prev: &na::Point2<f32>, curr: &na::Point2<f32>) -> bool {
        math::segments_intersect(prev, curr, &self.start, &self.end)
    }

    /// Crossing in the counting direction.
    #[inline]
    pub fn crossed_by(&self, prev: &na::Point2<f32>, curr: &na::Point2<f32>) -> bool {
        self.intersects(prev, curr) && self.direction.matches(prev, curr)
    }
}

impl Default for CountingLine {
    fn default() -> Self {
        Self::new(
            na::Point2::new(100.0, 300.0),
            na::Point2::new(800.0, 300.0),
            Direction::Down,
        )
    }
}

use crate::circular_queue::CircularQueue;
use crate::error::Error;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_PREFIX: &str = "obj_";

/// Tracking identity, rendered as `obj_{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ID_PREFIX, self.0)
    }
}

impl FromStr for TrackId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(ID_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(TrackId)
            .ok_or_else(|| Error::InvalidTrackId(s.to_string()))
    }
}

impl TryFrom<String> for TrackId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pos: na::Point2<f32>,
    // in seconds
    pub ts: f32,
}

/// Position history of one physical object.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    history: CircularQueue<Sample>,
}

impl Track {
    pub fn new(id: TrackId, max_history: usize) -> Self {
        Self {
            id,
            history: CircularQueue::with_capacity(max_history),
        }
    }

    #[inline]
    pub fn push(&mut self, pos: na::Point2<f32>, ts: f32) {
        self.history.push(Sample { pos, ts });
    }

    #[inline]
    pub fn last(&self) -> Option<&Sample> {
        self.history.newest()
    }

    /// The two most recent samples as `(previous, current)`.
    pub fn last_step(&self) -> Option<(&Sample, &Sample)> {
        let mut iter = self.history.iter();
        let curr = iter.next()?;
        let prev = iter.next()?;

        Some((prev, curr))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Newest to oldest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.history.iter()
    }

    /// Samples in chronological order.
    pub fn samples(&self) -> Vec<Sample> {
        self.history.asc_iter().copied().collect()
    }
}

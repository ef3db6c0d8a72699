use crate::math;
use crate::track::Track;

use nalgebra as na;
use serde_derive::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct MovementInfo {
    // px per second
    pub speed: f32,
    // px
    pub distance: f32,
    pub stopped: bool,
}

impl MovementInfo {
    /// Not enough samples to tell, treated as standing still.
    pub const STATIONARY: MovementInfo = MovementInfo {
        speed: 0.0,
        distance: 0.0,
        stopped: true,
    };
}

impl Default for MovementInfo {
    fn default() -> Self {
        Self::STATIONARY
    }
}

/// Speed over the samples no older than `window` seconds from the newest one.
pub fn estimate(track: &Track, window: f32, stop_speed: f32) -> MovementInfo {
    let newest = match track.last() {
        Some(s) => s.ts,
        None => return MovementInfo::STATIONARY,
    };

    let windowed: Vec<_> = track
        .iter()
        .take_while(|s| newest - s.ts <= window)
        .collect();

    if windowed.len() < 2 {
        return MovementInfo::STATIONARY;
    }

    let points: Vec<na::Point2<f32>> = windowed.iter().map(|s| s.pos).collect();
    let distance = math::path_length(&points);

    let elapsed = newest - windowed[windowed.len() - 1].ts;
    let speed = if elapsed > 0.0 {
        distance / elapsed
    } else {
        0.0
    };

    MovementInfo {
        speed,
        distance,
        stopped: speed < stop_speed,
    }
}

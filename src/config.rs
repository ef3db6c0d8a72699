use crate::error::Error;
use crate::line::{CountingLine, Direction};

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub max_history: usize,
    // px, nearest previous position must be closer than this to match
    pub match_distance: f32,
    // seconds without update before a track is evicted
    pub max_age: f32,
    // px per second
    pub stop_speed: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_history: 30,
            match_distance: 50.0,
            max_age: 2.0,
            stop_speed: 5.0,
        }
    }
}

/// Flat layout kept compatible with existing settings files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VirtualLineConfig {
    pub p1_x: f32,
    pub p1_y: f32,
    pub p2_x: f32,
    pub p2_y: f32,
    pub counting_direction: Direction,
}

impl Default for VirtualLineConfig {
    fn default() -> Self {
        Self {
            p1_x: 100.0,
            p1_y: 300.0,
            p2_x: 800.0,
            p2_y: 300.0,
            counting_direction: Direction::Down,
        }
    }
}

impl From<&VirtualLineConfig> for CountingLine {
    fn from(c: &VirtualLineConfig) -> Self {
        CountingLine::new(
            na::Point2::new(c.p1_x, c.p1_y),
            na::Point2::new(c.p2_x, c.p2_y),
            c.counting_direction,
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CongestionThresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for CongestionThresholds {
    fn default() -> Self {
        Self {
            low: 5,
            medium: 15,
            high: 25,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrafficConfig {
    pub vehicle_classes: Vec<String>,
    pub congestion_thresholds: CongestionThresholds,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            vehicle_classes: strings(&["car", "motorbike", "truck", "bus"]),
            congestion_thresholds: CongestionThresholds::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnomalyConfig {
    // seconds
    pub stop_time_threshold: f32,
    // seconds of history used to decide whether a vehicle stands still
    pub movement_window: f32,
    pub pedestrian_classes: Vec<String>,
    pub animal_classes: Vec<String>,
    pub obstacle_classes: Vec<String>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            stop_time_threshold: 20.0,
            movement_window: 1.0,
            pedestrian_classes: strings(&["person"]),
            animal_classes: strings(&["dog", "cat", "bird", "animal"]),
            obstacle_classes: strings(&["obstacle", "debris", "rock", "tree", "garbage"]),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub virtual_line: VirtualLineConfig,
    pub traffic: TrafficConfig,
    pub anomaly: AnomalyConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_json(s: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;

        Ok(config)
    }

    #[inline]
    pub fn counting_line(&self) -> CountingLine {
        (&self.virtual_line).into()
    }

    pub fn validate(&self) -> Result<(), Error> {
        let t = &self.tracker;
        if t.max_history < 2 {
            return Err(invalid("tracker.max_history must be at least 2"));
        }
        if !(t.match_distance > 0.0) {
            return Err(invalid("tracker.match_distance must be positive"));
        }
        if !(t.max_age > 0.0) {
            return Err(invalid("tracker.max_age must be positive"));
        }
        if !(t.stop_speed >= 0.0) {
            return Err(invalid("tracker.stop_speed must not be negative"));
        }

        if self.counting_line().is_degenerate() {
            return Err(invalid("virtual_line endpoints must differ"));
        }

        let c = &self.traffic.congestion_thresholds;
        if !(c.low < c.medium && c.medium < c.high) {
            return Err(invalid(
                "traffic.congestion_thresholds must be strictly increasing",
            ));
        }

        let a = &self.anomaly;
        if !(a.stop_time_threshold > 0.0) {
            return Err(invalid("anomaly.stop_time_threshold must be positive"));
        }
        if !(a.movement_window > 0.0) {
            return Err(invalid("anomaly.movement_window must be positive"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidConfig(msg.to_string())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.tracker.max_history, 30);
        assert_eq!(config.counting_line(), CountingLine::default());
        assert_eq!(config.anomaly.stop_time_threshold, 20.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = Config::from_json(
            r#"{
                "virtual_line": {"p1_x": 400, "p1_y": 100, "p2_x": 400, "p2_y": 500, "counting_direction": "right"},
                "tracker": {"match_distance": 80}
            }"#,
        )
        .unwrap();

        let line = config.counting_line();
        assert_eq!(line.direction, Direction::Right);
        assert_eq!(line.start, na::Point2::new(400.0, 100.0));
        assert_eq!(config.tracker.match_distance, 80.0);
        assert_eq!(config.tracker.max_age, 2.0);
        assert_eq!(config.traffic.vehicle_classes.len(), 4);
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = Config::from_json(r#"{"virtual_line": {"counting_direction": "north"}}"#);
        assert!(matches!(err, Err(Error::JsonError(_))));
    }

    #[test]
    fn rejects_degenerate_line() {
        let err = Config::from_json(
            r#"{"virtual_line": {"p1_x": 10, "p1_y": 10, "p2_x": 10, "p2_y": 10}}"#,
        );
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let mut config = Config::default();
        config.traffic.congestion_thresholds.medium = 3;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_nan_gate() {
        let mut config = Config::default();
        config.tracker.match_distance = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/roadwatch.json"),
            Err(Error::IoError(_))
        ));
    }
}

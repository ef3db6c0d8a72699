use crate::bbox::{BBox, Ltwh};
use crate::config::{CongestionThresholds, TrafficConfig};
use crate::line::{CountingLine, Direction};
use crate::track::TrackId;
use crate::tracker::VehicleTracker;
use crate::Detection;

use serde_derive::Serialize;
use std::collections::BTreeMap;

const SECONDS_IN_MINUTE: f32 = 60.0;
const SECONDS_IN_HOUR: f32 = 3600.0;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DensityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DensityLevel {
    pub fn classify(count: usize, thresholds: &CongestionThresholds) -> Self {
        let count = count as u64;

        if count < thresholds.low as u64 {
            DensityLevel::Low
        } else if count < thresholds.medium as u64 {
            DensityLevel::Medium
        } else if count < thresholds.high as u64 {
            DensityLevel::High
        } else {
            DensityLevel::VeryHigh
        }
    }
}

/// A vehicle counted on the line, one per track id.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    pub object_id: TrackId,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BBox<Ltwh>,
    pub timestamp: f32,
    pub direction: Direction,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrafficStatistics {
    pub total_vehicles: u64,
    pub by_class: BTreeMap<String, u64>,
    pub by_direction: BTreeMap<Direction, u64>,
    // minute index -> class -> crossings in that minute
    pub per_minute: BTreeMap<u64, BTreeMap<String, u64>>,
    // hour index -> class -> most vehicles seen in a single frame
    pub hourly_peaks: BTreeMap<u64, BTreeMap<String, u64>>,
    pub line: CountingLine,
}

/// Line-crossing counts and frame density over one video.
#[derive(Debug)]
pub struct TrafficMonitor {
    line: CountingLine,
    config: TrafficConfig,
    total: u64,
    by_class: BTreeMap<String, u64>,
    by_direction: BTreeMap<Direction, u64>,
    per_minute: BTreeMap<u64, BTreeMap<String, u64>>,
    hourly_peaks: BTreeMap<u64, BTreeMap<String, u64>>,
}

impl TrafficMonitor {
    pub fn new(line: CountingLine, config: TrafficConfig) -> Self {
        log::info!(
            "virtual line: ({}, {}) -> ({}, {}), direction: {}",
            line.start.x,
            line.start.y,
            line.end.x,
            line.end.y,
            line.direction
        );

        let mut monitor = Self {
            line,
            config,
            total: 0,
            by_class: BTreeMap::new(),
            by_direction: BTreeMap::new(),
            per_minute: BTreeMap::new(),
            hourly_peaks: BTreeMap::new(),
        };
        monitor.init_counters();
        monitor
    }

    fn init_counters(&mut self) {
        self.by_class = self.zeroed_classes();
    }

    fn zeroed_classes(&self) -> BTreeMap<String, u64> {
        self.config
            .vehicle_classes
            .iter()
            .map(|c| (c.clone(), 0))
            .collect()
    }

    #[inline]
    pub fn line(&self) -> &CountingLine {
        &self.line
    }

    #[inline]
    pub fn is_vehicle(&self, det: &Detection) -> bool {
        det.is_class(&self.config.vehicle_classes)
    }

    /// Number of vehicle detections in `detections`.
    pub fn vehicles_in_frame(&self, detections: &[Detection]) -> usize {
        detections.iter().filter(|d| self.is_vehicle(d)).count()
    }

    /// Counts vehicles whose last step crossed the line. `detections` must
    /// already carry their track ids.
    pub fn process_frame(
        &mut self,
        detections: &[Detection],
        tracker: &mut VehicleTracker,
        timestamp: f32,
    ) -> Vec<CrossingEvent> {
        let mut frame_counts = self.zeroed_classes();
        let mut events = Vec::new();

        for det in detections {
            if !self.is_vehicle(det) {
                continue;
            }

            let id = match det.id {
                Some(id) => id,
                None => continue,
            };

            *frame_counts.entry(det.class_name.clone()).or_insert(0) += 1;

            if tracker.check_crossing(id, &self.line) {
                log::info!("vehicle crossed: {} ({})", det.class_name, id);

                self.add_vehicle(&det.class_name, timestamp);
                events.push(CrossingEvent {
                    object_id: id,
                    class_name: det.class_name.clone(),
                    confidence: det.confidence,
                    bbox: det.bbox,
                    timestamp,
                    direction: self.line.direction,
                });
            }
        }

        self.update_hourly_peaks(timestamp, frame_counts);

        events
    }

    fn add_vehicle(&mut self, class_name: &str, timestamp: f32) {
        self.total += 1;
        *self.by_class.entry(class_name.to_string()).or_insert(0) += 1;
        *self.by_direction.entry(self.line.direction).or_insert(0) += 1;

        let minute = bucket(timestamp, SECONDS_IN_MINUTE);
        *self
            .per_minute
            .entry(minute)
            .or_insert_with(BTreeMap::new)
            .entry(class_name.to_string())
            .or_insert(0) += 1;
    }

    fn update_hourly_peaks(&mut self, timestamp: f32, frame_counts: BTreeMap<String, u64>) {
        let hour = bucket(timestamp, SECONDS_IN_HOUR);
        let peaks = self.hourly_peaks.entry(hour).or_insert_with(BTreeMap::new);

        for (class, count) in frame_counts {
            let peak = peaks.entry(class).or_insert(0);
            *peak = (*peak).max(count);
        }
    }

    #[inline]
    pub fn density_level(&self, vehicle_count: usize) -> DensityLevel {
        DensityLevel::classify(vehicle_count, &self.config.congestion_thresholds)
    }

    #[inline]
    pub fn total_vehicles(&self) -> u64 {
        self.total
    }

    pub fn count_of(&self, class_name: &str) -> u64 {
        self.by_class.get(class_name).copied().unwrap_or(0)
    }

    /// Crossings counted in the minute that `timestamp` falls in.
    pub fn minute_total(&self, timestamp: f32) -> u64 {
        self.per_minute
            .get(&bucket(timestamp, SECONDS_IN_MINUTE))
            .map(|m| m.values().sum())
            .unwrap_or(0)
    }

    pub fn statistics(&self) -> TrafficStatistics {
        TrafficStatistics {
            total_vehicles: self.total,
            by_class: self.by_class.clone(),
            by_direction: self.by_direction.clone(),
            per_minute: self.per_minute.clone(),
            hourly_peaks: self.hourly_peaks.clone(),
            line: self.line,
        }
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.by_direction.clear();
        self.per_minute.clear();
        self.hourly_peaks.clear();
        self.init_counters();

        log::info!("traffic monitor reset");
    }
}

// negative timestamps land in bucket 0
#[inline]
fn bucket(timestamp: f32, size: f32) -> u64 {
    (timestamp / size).floor().max(0.0) as u64
}

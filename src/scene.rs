use crate::anomaly::{ActiveStop, Anomaly, AnomalyDetector};
use crate::config::Config;
use crate::monitor::{CrossingEvent, DensityLevel, TrafficMonitor, TrafficStatistics};
use crate::track::TrackId;
use crate::tracker::VehicleTracker;
use crate::{Detection, Frame};

use serde_derive::Serialize;

/// Everything one frame produced.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    pub timestamp: f32,
    pub detections: Vec<Detection>,
    pub crossings: Vec<CrossingEvent>,
    pub anomalies: Vec<Anomaly>,
    pub resolved: Vec<TrackId>,
    pub vehicles_in_frame: usize,
    pub density: DensityLevel,
}

impl FrameReport {
    /// Nothing worth persisting happened in this frame.
    #[inline]
    pub fn is_quiet(&self) -> bool {
        self.crossings.is_empty() && self.anomalies.is_empty() && self.resolved.is_empty()
    }
}

/// Per-source pipeline: tracking, counting and anomaly detection.
#[derive(Debug)]
pub struct Scene {
    pub tracker: VehicleTracker,
    pub monitor: TrafficMonitor,
    pub anomalies: AnomalyDetector,
    last_timestamp: Option<f32>,
}

impl Scene {
    pub fn new(config: &Config) -> Self {
        Self {
            tracker: VehicleTracker::new(config.tracker.clone()),
            monitor: TrafficMonitor::new(config.counting_line(), config.traffic.clone()),
            anomalies: AnomalyDetector::new(
                config.anomaly.clone(),
                config.traffic.vehicle_classes.clone(),
            ),
            last_timestamp: None,
        }
    }

    pub fn process(&mut self, mut frame: Frame) -> FrameReport {
        let ts = frame.timestamp;

        if let Some(last) = self.last_timestamp {
            if ts < last {
                log::warn!(
                    "frame {} goes back in time ({:.3}s after {:.3}s)",
                    frame.index,
                    ts,
                    last
                );
            }
        }
        self.last_timestamp = Some(ts);

        self.tracker.update_tracks(&mut frame.detections, ts);

        let untracked = frame.detections.iter().filter(|d| d.id.is_none()).count();
        if untracked > 0 {
            log::debug!(
                "frame {}: {} detections without center left unassigned",
                frame.index,
                untracked
            );
        }

        let crossings = self
            .monitor
            .process_frame(&frame.detections, &mut self.tracker, ts);
        let report = self
            .anomalies
            .detect_anomalies(&frame.detections, &self.tracker, ts);

        let vehicles_in_frame = self.monitor.vehicles_in_frame(&frame.detections);

        FrameReport {
            index: frame.index,
            timestamp: ts,
            detections: frame.detections,
            crossings,
            anomalies: report.anomalies,
            resolved: report.resolved,
            vehicles_in_frame,
            density: self.monitor.density_level(vehicles_in_frame),
        }
    }

    #[inline]
    pub fn statistics(&self) -> TrafficStatistics {
        self.monitor.statistics()
    }

    pub fn active_stops(&self) -> Vec<ActiveStop> {
        self.anomalies.active_stops(self.last_timestamp.unwrap_or(0.0))
    }

    /// Between independent videos.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.monitor.reset();
        self.anomalies.reset();
        self.last_timestamp = None;
    }
}

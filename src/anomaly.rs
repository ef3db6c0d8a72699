use crate::bbox::{BBox, Ltwh};
use crate::config::AnomalyConfig;
use crate::track::TrackId;
use crate::tracker::VehicleTracker;
use crate::Detection;

use nalgebra as na;
use serde_derive::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Pedestrian,
    Animal,
    Obstacle,
    StoppedVehicle,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub message: String,
    pub timestamp: f32,
    pub object_id: Option<TrackId>,
    pub object_class: String,
    pub position: Option<na::Point2<f32>>,
    pub bbox: BBox<Ltwh>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_duration: Option<f32>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    // vehicles that moved again after being flagged as stopped
    pub resolved: Vec<TrackId>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ActiveStop {
    pub id: TrackId,
    pub class_name: String,
    pub position: Option<na::Point2<f32>>,
    pub duration: f32,
}

#[derive(Debug, Clone)]
struct StopRecord {
    started_at: f32,
    position: Option<na::Point2<f32>>,
    class_name: String,
    // a StoppedVehicle anomaly was raised for this stop
    flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Category {
    Pedestrian,
    Animal,
    Obstacle,
    Vehicle,
}

/// Flags pedestrians, animals and obstacles on sight, and vehicles that
/// have stood still longer than the stop threshold.
#[derive(Debug)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    vehicle_classes: Vec<String>,
    stopped: HashMap<TrackId, StopRecord>,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig, vehicle_classes: Vec<String>) -> Self {
        Self {
            config,
            vehicle_classes,
            stopped: HashMap::new(),
        }
    }

    fn category(&self, det: &Detection) -> Option<Category> {
        if det.is_class(&self.config.pedestrian_classes) {
            Some(Category::Pedestrian)
        } else if det.is_class(&self.config.animal_classes) {
            Some(Category::Animal)
        } else if det.is_class(&self.config.obstacle_classes) {
            Some(Category::Obstacle)
        } else if det.is_class(&self.vehicle_classes) {
            Some(Category::Vehicle)
        } else {
            None
        }
    }

    pub fn detect_anomalies(
        &mut self,
        detections: &[Detection],
        tracker: &VehicleTracker,
        timestamp: f32,
    ) -> AnomalyReport {
        let mut report = AnomalyReport::default();

        for det in detections {
            let found = match self.category(det) {
                Some(Category::Pedestrian) => Some(anomaly(
                    AnomalyKind::Pedestrian,
                    format!("pedestrian at {}", format_position(det.center())),
                    det,
                    timestamp,
                )),
                Some(Category::Animal) => Some(anomaly(
                    AnomalyKind::Animal,
                    format!("animal on the road: {}", det.class_name),
                    det,
                    timestamp,
                )),
                Some(Category::Obstacle) => Some(anomaly(
                    AnomalyKind::Obstacle,
                    format!("obstacle: {}", det.class_name),
                    det,
                    timestamp,
                )),
                Some(Category::Vehicle) => {
                    self.check_stopped_vehicle(det, tracker, timestamp, &mut report.resolved)
                }
                None => None,
            };

            if let Some(a) = found {
                report.anomalies.push(a);
            }
        }

        self.stopped.retain(|id, _| {
            let alive = tracker.is_tracked(*id);
            if !alive {
                log::debug!("dropping stop record of evicted track {}", id);
            }
            alive
        });

        report
    }

    fn check_stopped_vehicle(
        &mut self,
        det: &Detection,
        tracker: &VehicleTracker,
        timestamp: f32,
        resolved: &mut Vec<TrackId>,
    ) -> Option<Anomaly> {
        let id = det.id?;
        let movement = tracker.get_movement_info(id, self.config.movement_window);

        if !movement.stopped {
            if let Some(record) = self.stopped.remove(&id) {
                if record.flagged {
                    log::info!("vehicle {} resumed moving", id);
                    resolved.push(id);
                }
            }
            return None;
        }

        let record = match self.stopped.get_mut(&id) {
            Some(r) => r,
            None => {
                log::info!("vehicle {} started stopping at {:.1}s", id, timestamp);
                self.stopped.insert(
                    id,
                    StopRecord {
                        started_at: timestamp,
                        position: det.center(),
                        class_name: det.class_name.clone(),
                        flagged: false,
                    },
                );
                return None;
            }
        };

        let duration = timestamp - record.started_at;
        let threshold = self.config.stop_time_threshold;
        if duration <= threshold {
            return None;
        }
        record.flagged = true;

        let severity = if duration > threshold * 2.0 {
            Severity::Critical
        } else {
            Severity::High
        };

        let mut a = anomaly(
            AnomalyKind::StoppedVehicle,
            format!("{} stopped abnormally ({}s)", det.class_name, duration as u32),
            det,
            timestamp,
        );
        a.severity = severity;
        a.stop_duration = Some(duration);

        Some(a)
    }

    /// Vehicles currently considered stopped, oldest stop first.
    pub fn active_stops(&self, now: f32) -> Vec<ActiveStop> {
        let mut stops: Vec<_> = self
            .stopped
            .iter()
            .map(|(id, r)| ActiveStop {
                id: *id,
                class_name: r.class_name.clone(),
                position: r.position,
                duration: (now - r.started_at).max(0.0),
            })
            .collect();

        stops.sort_by(|a, b| b.duration.total_cmp(&a.duration).then(a.id.cmp(&b.id)));
        stops
    }

    #[inline]
    pub fn is_stopped(&self, id: TrackId) -> bool {
        self.stopped.contains_key(&id)
    }

    pub fn reset(&mut self) {
        self.stopped.clear();
        log::info!("anomaly detector reset");
    }
}

fn anomaly(kind: AnomalyKind, message: String, det: &Detection, timestamp: f32) -> Anomaly {
    Anomaly {
        kind,
        message,
        timestamp,
        object_id: det.id,
        object_class: det.class_name.clone(),
        position: det.center(),
        bbox: det.bbox,
        severity: Severity::Medium,
        stop_duration: None,
    }
}

fn format_position(pos: Option<na::Point2<f32>>) -> String {
    match pos {
        Some(p) => format!("({}, {})", p.x as i32, p.y as i32),
        None => "unknown position".to_string(),
    }
}

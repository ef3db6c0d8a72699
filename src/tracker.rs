use crate::config::TrackerConfig;
use crate::line::{CountingLine, Direction};
use crate::movement::{self, MovementInfo};
use crate::track::{Track, TrackId};
use crate::Detection;

use nalgebra as na;
use std::collections::{HashMap, HashSet};

/// Frame to frame identity assignment by nearest previous centroid.
///
/// Matching is greedy: every detection independently takes the closest
/// previous position inside the gate, so two detections may claim the same
/// id in one frame. Ids are never revived, an object reappearing after its
/// track was evicted (or after missing a single frame) gets a new one.
#[derive(Debug)]
pub struct VehicleTracker {
    config: TrackerConfig,
    tracks: HashMap<TrackId, Track>,
    // previous frame only, in assignment order
    last_positions: Vec<(TrackId, na::Point2<f32>)>,
    counted: HashSet<TrackId>,
    next_id: u32,
}

impl VehicleTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
            last_positions: Vec::new(),
            counted: HashSet::new(),
            next_id: 0,
        }
    }

    /// Assigns ids to `detections` in place. Detections without a center are
    /// left untouched and keep whatever id they came with.
    pub fn update_tracks(&mut self, detections: &mut [Detection], timestamp: f32) {
        let mut current: Vec<(TrackId, na::Point2<f32>)> = Vec::with_capacity(detections.len());
        let mut unmatched = Vec::new();

        for (idx, det) in detections.iter_mut().enumerate() {
            let center = match det.center() {
                Some(c) => c,
                None => continue,
            };

            match self.nearest(&center) {
                Some(id) => {
                    det.id = Some(id);
                    upsert(&mut current, id, center);
                    self.push_sample(id, center, timestamp);
                }
                None => unmatched.push((idx, center)),
            }
        }

        for (idx, center) in unmatched {
            let id = TrackId(self.next_id);
            self.next_id += 1;

            log::debug!("new track {} at ({:.1}, {:.1})", id, center.x, center.y);

            detections[idx].id = Some(id);
            upsert(&mut current, id, center);
            self.push_sample(id, center, timestamp);
        }

        self.last_positions = current;
        self.cleanup_old_tracks(timestamp, self.config.max_age);
    }

    fn nearest(&self, center: &na::Point2<f32>) -> Option<TrackId> {
        let mut best = None;
        let mut min_dist = f32::INFINITY;

        for (id, pos) in &self.last_positions {
            let dist = na::distance(center, pos);

            if dist < self.config.match_distance && dist < min_dist {
                min_dist = dist;
                best = Some(*id);
            }
        }

        best
    }

    fn push_sample(&mut self, id: TrackId, pos: na::Point2<f32>, ts: f32) {
        let max_history = self.config.max_history;

        self.tracks
            .entry(id)
            .or_insert_with(|| Track::new(id, max_history))
            .push(pos, ts);
    }

    /// Drops tracks whose newest sample is more than `max_age` older than
    /// `now`, along with tracks that have no samples at all.
    pub fn cleanup_old_tracks(&mut self, now: f32, max_age: f32) {
        let before = self.tracks.len();

        self.tracks.retain(|id, track| match track.last() {
            Some(s) if now - s.ts <= max_age => true,
            _ => {
                log::debug!("evicting track {}", id);
                false
            }
        });

        if self.tracks.len() != before {
            let tracks = &self.tracks;
            self.last_positions.retain(|(id, _)| tracks.contains_key(id));
        }
    }

    /// Whether the last step of `id` crossed `start-end` in `direction`.
    /// Returns true at most once per id for the lifetime of the tracker.
    pub fn check_line_crossing(
        &mut self,
        id: TrackId,
        start: na::Point2<f32>,
        end: na::Point2<f32>,
        direction: Direction,
    ) -> bool {
        self.check_crossing(id, &CountingLine::new(start, end, direction))
    }

    pub fn check_crossing(&mut self, id: TrackId, line: &CountingLine) -> bool {
        let crossed = match self.tracks.get(&id).and_then(|t| t.last_step()) {
            Some((prev, curr)) => line.crossed_by(&prev.pos, &curr.pos),
            None => false,
        };

        crossed && self.counted.insert(id)
    }

    /// Movement over the last `window` seconds of `id`'s history.
    pub fn get_movement_info(&self, id: TrackId, window: f32) -> MovementInfo {
        match self.tracks.get(&id) {
            Some(track) => movement::estimate(track, window, self.config.stop_speed),
            None => MovementInfo::STATIONARY,
        }
    }

    #[inline]
    pub fn history(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn is_tracked(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    #[inline]
    pub fn is_counted(&self, id: TrackId) -> bool {
        self.counted.contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
        self.last_positions.clear();
        self.counted.clear();
        self.next_id = 0;

        log::info!("tracker reset");
    }
}

impl Default for VehicleTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

// keeps first-assignment order when an id is claimed twice in one frame
fn upsert(positions: &mut Vec<(TrackId, na::Point2<f32>)>, id: TrackId, pos: na::Point2<f32>) {
    match positions.iter_mut().find(|(i, _)| *i == id) {
        Some(entry) => entry.1 = pos,
        None => positions.push((id, pos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use approx::assert_abs_diff_eq;

    // detection whose center lands on (cx, cy)
    fn det(class: &str, cx: f32, cy: f32) -> Detection {
        Detection::new(class, 0.9, BBox::ltwh(cx - 20.0, cy - 20.0, 40.0, 40.0))
    }

    fn step(tracker: &mut VehicleTracker, points: &[(f32, f32)], ts: f32) -> Vec<Detection> {
        let mut dets: Vec<_> = points.iter().map(|&(x, y)| det("car", x, y)).collect();
        tracker.update_tracks(&mut dets, ts);
        dets
    }

    fn id_of(d: &Detection) -> TrackId {
        d.id.unwrap()
    }

    #[test]
    fn unique_ids_for_separated_objects() {
        let mut tracker = VehicleTracker::default();
        let dets = step(&mut tracker, &[(150.0, 150.0), (350.0, 350.0), (550.0, 550.0)], 1.0);

        let ids: HashSet<_> = dets.iter().map(id_of).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(id_of(&dets[0]).to_string(), "obj_0");
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn nearby_detection_keeps_id() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0)], 0.0);
        let second = step(&mut tracker, &[(103.0, 101.0), (500.0, 500.0)], 0.04);

        assert_eq!(id_of(&second[0]), id_of(&first[0]));
        assert_eq!(tracker.history(id_of(&first[0])).unwrap().len(), 2);
        assert_ne!(id_of(&second[1]), id_of(&first[0]));
        assert_eq!(tracker.history(id_of(&second[1])).unwrap().len(), 1);
    }

    #[test]
    fn gate_is_strict() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0)], 0.0);
        let second = step(&mut tracker, &[(150.0, 100.0)], 0.1);

        assert_ne!(id_of(&second[0]), id_of(&first[0]));
    }

    #[test]
    fn picks_the_closest_previous_track() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0), (140.0, 100.0)], 0.0);
        let second = step(&mut tracker, &[(130.0, 100.0)], 0.1);

        assert_eq!(id_of(&second[0]), id_of(&first[1]));
    }

    #[test]
    fn greedy_matching_allows_shared_claims() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0)], 0.0);
        let second = step(&mut tracker, &[(105.0, 100.0), (95.0, 100.0)], 0.1);

        assert_eq!(id_of(&second[0]), id_of(&first[0]));
        assert_eq!(id_of(&second[1]), id_of(&first[0]));
        assert_eq!(tracker.history(id_of(&first[0])).unwrap().len(), 3);
    }

    #[test]
    fn history_follows_centers() {
        let mut tracker = VehicleTracker::default();
        let positions = [(150.0, 150.0), (160.0, 160.0), (170.0, 170.0), (180.0, 180.0)];

        let mut id = None;
        for (i, &p) in positions.iter().enumerate() {
            let dets = step(&mut tracker, &[p], i as f32 * 0.5);
            id.get_or_insert(id_of(&dets[0]));
        }

        let samples = tracker.history(id.unwrap()).unwrap().samples();
        assert_eq!(samples.len(), 4);
        for (s, (&(x, y), i)) in samples.iter().zip(positions.iter().zip(0..)) {
            assert_abs_diff_eq!(s.pos.x, x);
            assert_abs_diff_eq!(s.pos.y, y);
            assert_abs_diff_eq!(s.ts, i as f32 * 0.5);
        }
    }

    #[test]
    fn history_is_capped() {
        let mut tracker = VehicleTracker::default();

        let mut id = None;
        for i in 0..40 {
            let dets = step(&mut tracker, &[(100.0 + i as f32, 100.0)], i as f32 * 0.04);
            id.get_or_insert(id_of(&dets[0]));
        }

        assert_eq!(tracker.history(id.unwrap()).unwrap().len(), 30);
    }

    #[test]
    fn missing_center_passes_through() {
        let mut tracker = VehicleTracker::default();

        let mut dets = vec![
            Detection::new("car", 0.9, BBox::ltwh(f32::NAN, 0.0, 10.0, 10.0)),
            det("car", 100.0, 100.0),
        ];
        tracker.update_tracks(&mut dets, 0.0);

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].id, None);
        assert_eq!(dets[1].id, Some(TrackId(0)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn stale_tracks_are_evicted() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0), (600.0, 600.0)], 0.0);
        let old = id_of(&first[1]);

        // only the first object keeps showing up
        for i in 1..=5 {
            step(&mut tracker, &[(100.0, 100.0)], i as f32 * 0.5);
        }

        assert!(!tracker.is_tracked(old));
        assert!(tracker.is_tracked(id_of(&first[0])));

        // same place, but the identity is not revived
        let again = step(&mut tracker, &[(100.0, 100.0), (600.0, 600.0)], 3.0);
        assert_ne!(id_of(&again[1]), old);
    }

    #[test]
    fn track_within_max_age_is_kept() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(600.0, 600.0)], 0.0);
        step(&mut tracker, &[(100.0, 100.0)], 2.0);

        assert!(tracker.is_tracked(id_of(&first[0])));

        step(&mut tracker, &[(100.0, 100.0)], 2.1);
        assert!(!tracker.is_tracked(id_of(&first[0])));
    }

    #[test]
    fn missed_frame_loses_identity() {
        let mut tracker = VehicleTracker::default();

        let first = step(&mut tracker, &[(100.0, 100.0)], 0.0);
        step(&mut tracker, &[], 0.04);
        let third = step(&mut tracker, &[(101.0, 100.0)], 0.08);

        assert_ne!(id_of(&third[0]), id_of(&first[0]));
    }

    #[test]
    fn counts_downward_crossing_once() {
        let mut tracker = VehicleTracker::default();
        let line = CountingLine::default();

        let mut id = None;
        let mut crossings = 0;
        for (i, y) in [260.0, 280.0, 300.5, 320.0, 340.0].iter().enumerate() {
            let dets = step(&mut tracker, &[(400.0, *y)], i as f32 * 0.1);
            let obj = *id.get_or_insert(id_of(&dets[0]));

            if tracker.check_crossing(obj, &line) {
                crossings += 1;
            }
            // asking twice in the same frame never counts twice
            assert!(!tracker.check_crossing(obj, &line));
        }

        assert_eq!(crossings, 1);
        assert!(tracker.is_counted(id.unwrap()));
    }

    #[test]
    fn wrong_direction_never_counts() {
        let mut tracker = VehicleTracker::default();

        let mut id = None;
        for (i, y) in [260.0, 280.0, 300.5, 320.0].iter().enumerate() {
            let dets = step(&mut tracker, &[(400.0, *y)], i as f32 * 0.1);
            let obj = *id.get_or_insert(id_of(&dets[0]));

            assert!(!tracker.check_line_crossing(
                obj,
                na::Point2::new(100.0, 300.0),
                na::Point2::new(800.0, 300.0),
                Direction::Up,
            ));
        }

        assert!(!tracker.is_counted(id.unwrap()));
    }

    #[test]
    fn counts_upward_crossing() {
        let mut tracker = VehicleTracker::default();

        let mut results = Vec::new();
        let mut id = None;
        for (i, y) in [340.0, 320.0, 290.0, 270.0].iter().enumerate() {
            let dets = step(&mut tracker, &[(400.0, *y)], i as f32 * 0.1);
            let obj = *id.get_or_insert(id_of(&dets[0]));

            results.push(tracker.check_line_crossing(
                obj,
                na::Point2::new(100.0, 300.0),
                na::Point2::new(800.0, 300.0),
                Direction::Up,
            ));
        }

        assert_eq!(results, vec![false, false, true, false]);
    }

    #[test]
    fn counts_leftward_crossing() {
        let mut tracker = VehicleTracker::default();

        let mut results = Vec::new();
        let mut id = None;
        for (i, x) in [460.0, 430.0, 390.0, 360.0].iter().enumerate() {
            let dets = step(&mut tracker, &[(*x, 250.0)], i as f32 * 0.1);
            let obj = *id.get_or_insert(id_of(&dets[0]));

            results.push(tracker.check_line_crossing(
                obj,
                na::Point2::new(400.0, 100.0),
                na::Point2::new(400.0, 500.0),
                Direction::Left,
            ));
        }

        assert_eq!(results, vec![false, false, true, false]);
        assert!(tracker.is_counted(id.unwrap()));
    }

    #[test]
    fn recrossing_is_not_recounted() {
        let mut tracker = VehicleTracker::default();
        let line = CountingLine::new(
            na::Point2::new(100.0, 300.0),
            na::Point2::new(800.0, 300.0),
            Direction::Down,
        );

        let mut results = Vec::new();
        let mut id = None;
        for (i, y) in [280.0, 310.0, 290.0, 310.0].iter().enumerate() {
            let dets = step(&mut tracker, &[(400.0, *y)], i as f32 * 0.1);
            let obj = *id.get_or_insert(id_of(&dets[0]));
            results.push(tracker.check_crossing(obj, &line));
        }

        assert_eq!(results, vec![false, true, false, false]);
    }

    #[test]
    fn crossing_needs_two_samples() {
        let mut tracker = VehicleTracker::default();
        let dets = step(&mut tracker, &[(400.0, 300.0)], 0.0);

        assert!(!tracker.check_crossing(id_of(&dets[0]), &CountingLine::default()));
        assert!(!tracker.check_crossing(TrackId(99), &CountingLine::default()));
    }

    #[test]
    fn movement_of_unknown_track() {
        let tracker = VehicleTracker::default();
        assert_eq!(
            tracker.get_movement_info(TrackId(5), 1.0),
            MovementInfo::STATIONARY
        );
    }

    #[test]
    fn movement_of_moving_track() {
        let mut tracker = VehicleTracker::default();

        let mut id = None;
        for i in 0..5 {
            let dets = step(&mut tracker, &[(100.0 + i as f32 * 10.0, 100.0)], i as f32 * 0.25);
            id.get_or_insert(id_of(&dets[0]));
        }

        let info = tracker.get_movement_info(id.unwrap(), 1.0);
        assert_abs_diff_eq!(info.distance, 40.0, epsilon = 1e-3);
        assert_abs_diff_eq!(info.speed, 40.0, epsilon = 1e-3);
        assert!(!info.stopped);
    }

    #[test]
    fn reset_restarts_numbering() {
        let mut tracker = VehicleTracker::default();

        let dets = step(&mut tracker, &[(400.0, 280.0)], 0.0);
        step(&mut tracker, &[(400.0, 320.0)], 0.1);
        assert!(tracker.check_crossing(id_of(&dets[0]), &CountingLine::default()));

        step(&mut tracker, &[(900.0, 900.0), (10.0, 10.0)], 0.2);
        tracker.reset();

        assert!(tracker.is_empty());
        assert!(!tracker.is_counted(id_of(&dets[0])));

        // the old position no longer matches anything
        let after = step(&mut tracker, &[(400.0, 320.0)], 0.3);
        assert_eq!(id_of(&after[0]), TrackId(0));
        assert_eq!(tracker.history(TrackId(0)).unwrap().len(), 1);
    }
}

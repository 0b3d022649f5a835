use std::cmp::Ordering;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::circular_queue::CircularQueue;
use crate::detection::Detection;

const HISTORY_CAPACITY: usize = 16;

/// Coarse per-frame movement of a track, from its last observed step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TrackedObject {
    pub id: u32,
    pub position: (i32, i32),
    pub bbox: BBox,
    pub direction: Option<Direction>,
}

pub struct TrackerConfig {
    pub distance_threshold: f32,
    pub max_age: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 120.0,
            max_age: 1.0,
        }
    }
}

#[derive(Debug)]
struct Track {
    id: u32,
    position: na::Point2<f32>,
    history: CircularQueue<na::Point2<f32>>,
    last_seen: f64,
    bbox: BBox,
}

impl Track {
    fn new(id: u32, det: &Detection, now: f64) -> Self {
        let position = na::Point2::new(det.center.0 as f32, det.center.1 as f32);
        let mut history = CircularQueue::with_capacity(HISTORY_CAPACITY);
        history.push(position);

        Self {
            id,
            position,
            history,
            last_seen: now,
            bbox: det.bbox,
        }
    }

    fn observe(&mut self, det: &Detection, now: f64) {
        self.position = na::Point2::new(det.center.0 as f32, det.center.1 as f32);
        self.history.push(self.position);
        self.last_seen = now;
        self.bbox = det.bbox;
    }

    /// Direction of the last observed step. Horizontal only when it strictly
    /// dominates, so a diagonal tie reads as vertical. Fewer than two points
    /// means no direction yet.
    fn direction(&self) -> Option<Direction> {
        let mut recent = self.history.iter();
        let newest = recent.next()?;
        let previous = recent.next()?;

        let dx = newest.x - previous.x;
        let dy = newest.y - previous.y;

        Some(if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    }

    fn snapshot(&self) -> TrackedObject {
        TrackedObject {
            id: self.id,
            position: (self.position.x as i32, self.position.y as i32),
            bbox: self.bbox,
            direction: self.direction(),
        }
    }
}

/// Greedy distance-bounded tracker.
///
/// Detections claim tracks in descending confidence order: each one takes
/// the nearest still-unclaimed track within the distance threshold, so when
/// two detections contest a track the stronger one keeps the identity and
/// the weaker one starts a fresh track. Tracks created this frame are not
/// claimable until the next frame. Unmatched tracks coast until they age
/// out.
pub struct ObjectTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u32,
}

impl ObjectTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::with_capacity(32),
            next_id: 1,
        }
    }

    pub fn update(&mut self, detections: &[Detection], now: f64) -> Vec<TrackedObject> {
        let mut order: Vec<usize> = (0..detections.len()).collect();
        order.sort_by(|&a, &b| {
            detections[b]
                .confidence
                .partial_cmp(&detections[a].confidence)
                .unwrap_or(Ordering::Equal)
        });

        let mut claimed = vec![false; self.tracks.len()];
        let mut unmatched = Vec::new();

        for det_idx in order {
            let det = &detections[det_idx];
            let center = na::Point2::new(det.center.0 as f32, det.center.1 as f32);

            let mut best: Option<(usize, f32)> = None;
            for (track_idx, track) in self.tracks.iter().enumerate() {
                if claimed[track_idx] {
                    continue;
                }

                let dist = na::distance(&track.position, &center);
                if dist < self.config.distance_threshold && best.map_or(true, |(_, d)| dist < d) {
                    best = Some((track_idx, dist));
                }
            }

            match best {
                Some((track_idx, _)) => {
                    claimed[track_idx] = true;
                    self.tracks[track_idx].observe(det, now);
                }
                None => unmatched.push(det_idx),
            }
        }

        for det_idx in unmatched {
            let id = self.next_id;
            self.next_id += 1;
            self.tracks.push(Track::new(id, &detections[det_idx], now));
        }

        let max_age = self.config.max_age;
        self.tracks.retain(|track| now - track.last_seen <= max_age);

        self.tracks.iter().map(Track::snapshot).collect()
    }

    /// Drops every track and restarts id allocation at 1.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

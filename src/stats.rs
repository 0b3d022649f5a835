use serde_derive::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::tracker::{Direction, TrackedObject};

pub struct StatsConfig {
    pub normal_ratio: f32,
    pub crowded_ratio: f32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            normal_ratio: 30.0,
            crowded_ratio: 70.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionCounts {
    pub left: u32,
    pub right: u32,
    pub up: u32,
    pub down: u32,
}

impl DirectionCounts {
    #[inline]
    fn tally(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.left += 1,
            Direction::Right => self.right += 1,
            Direction::Up => self.up += 1,
            Direction::Down => self.down += 1,
        }
    }

    #[inline]
    pub fn get(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.left + self.right + self.up + self.down
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    Free,
    Normal,
    Crowded,
}

impl CongestionLevel {
    /// Wire code for downstream consumers: 1 free, 2 normal, 3 crowded.
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            CongestionLevel::Free => 1,
            CongestionLevel::Normal => 2,
            CongestionLevel::Crowded => 3,
        }
    }
}

/// One frame's published statistics.
///
/// `people_count` comes from this frame's detections, not from the live
/// track set, so it can briefly diverge from the number of tracked objects
/// while a lost person coasts toward eviction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub people_count: usize,
    pub directions: DirectionCounts,
    pub area_ratio: f32,
    pub congestion: CongestionLevel,
    pub dominant_direction: Direction,
    pub dominant_count: u32,
}

pub struct StatsAggregator {
    config: StatsConfig,
}

impl StatsAggregator {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(
        &self,
        objects: &[TrackedObject],
        detections: &[Detection],
        frame_width: u32,
        frame_height: u32,
    ) -> StatsSnapshot {
        let mut directions = DirectionCounts::default();
        for object in objects {
            if let Some(direction) = object.direction {
                directions.tally(direction);
            }
        }

        // Boxes are summed as-is: overlaps count twice and nothing is
        // clipped to the frame. The ratio is a density proxy, not coverage.
        let frame_area = frame_width as f32 * frame_height as f32;
        let area_ratio = if frame_area > 0.0 {
            let covered: f32 = detections.iter().map(|det| det.bbox.area()).sum();
            100.0 * covered / frame_area
        } else {
            0.0
        };

        let congestion = if area_ratio >= self.config.crowded_ratio {
            CongestionLevel::Crowded
        } else if area_ratio >= self.config.normal_ratio {
            CongestionLevel::Normal
        } else {
            CongestionLevel::Free
        };

        // first strictly-greater tally wins, so an empty scene reads Left/0
        let mut dominant_direction = Direction::Left;
        let mut dominant_count = 0;
        for direction in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            let count = directions.get(direction);
            if count > dominant_count {
                dominant_direction = direction;
                dominant_count = count;
            }
        }

        StatsSnapshot {
            people_count: detections.len(),
            directions,
            area_ratio,
            congestion,
            dominant_direction,
            dominant_count,
        }
    }
}

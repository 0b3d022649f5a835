use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;

/// One candidate sighting in source-image coordinates. Lives for a single
/// frame: the tracker and the aggregator consume it and nothing keeps it
/// past the frame that produced it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Detection {
    pub bbox: BBox,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class_id: i32,
    pub center: (i32, i32),
}

impl Detection {
    #[inline]
    pub fn new(bbox: BBox, confidence: f32, class_id: i32) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            center: bbox.center(),
        }
    }

    #[inline]
    pub fn iou(&self, other: &Detection) -> f32 {
        self.bbox.iou(&other.bbox)
    }
}

use serde_derive::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixel space, stored as `[x1, y1, x2, y2]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BBox([f32; 4]);

impl BBox {
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2])
    }

    /// Corner box from the center + extent quad the model emits.
    #[inline]
    pub fn from_cxcywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        BBox([cx - w / 2., cy - h / 2., cx + w / 2., cy + h / 2.])
    }

    #[inline(always)]
    pub fn x1(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn y1(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn x2(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn y2(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.0[2] - self.0[0]
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Integer midpoint of the box, the point the tracker follows.
    #[inline]
    pub fn center(&self) -> (i32, i32) {
        (
            ((self.0[0] + self.0[2]) / 2.) as i32,
            ((self.0[1] + self.0[3]) / 2.) as i32,
        )
    }

    /// Intersection-over-union; a zero-area union yields 0.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.0[0].max(other.0[0]);
        let iy1 = self.0[1].max(other.0[1]);
        let ix2 = self.0[2].min(other.0[2]);
        let iy2 = self.0[3].min(other.0[3]);

        let inter = (ix2 - ix1).max(0.) * (iy2 - iy1).max(0.);
        let union = self.area() + other.area() - inter;

        if union > 0. {
            inter / union
        } else {
            0.
        }
    }

    /// Finite coordinates and a strictly positive extent on both axes.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite()) && self.0[2] > self.0[0] && self.0[3] > self.0[1]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }
}

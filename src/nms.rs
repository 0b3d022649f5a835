use std::cmp::Ordering;

use crate::detection::Detection;

/// Greedy non-max suppression over one frame's candidates.
///
/// Candidates are stably ordered by descending confidence, then each kept
/// box discards every later, still-live box overlapping it with IoU
/// strictly above the threshold. Survivors come back highest confidence
/// first.
pub fn suppress(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut suppressed = vec![false; candidates.len()];

    for idx in 0..candidates.len() {
        if suppressed[idx] {
            continue;
        }

        for later in idx + 1..candidates.len() {
            if !suppressed[later] && candidates[idx].iou(&candidates[later]) > iou_threshold {
                suppressed[later] = true;
            }
        }
    }

    candidates
        .into_iter()
        .zip(suppressed)
        .filter_map(|(det, dropped)| (!dropped).then_some(det))
        .collect()
}

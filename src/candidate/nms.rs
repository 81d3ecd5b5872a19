//! Greedy IoU-based non-maximum suppression over ranked candidates.

use crate::candidate::{sort_ranked_desc, Detection, Ranked};

/// Runs greedy NMS and returns kept detections in selection order.
///
/// `ranked` is sorted in place by descending score with index tie-breaks.
/// A lower-ranked candidate is removed when its IoU with a kept candidate
/// exceeds `iou_threshold`; with `per_class` only same-class pairs are
/// compared. Selection stops after `max_outputs` picks.
pub(crate) fn greedy_nms(
    ranked: &mut [Ranked],
    iou_threshold: f32,
    max_outputs: usize,
    per_class: bool,
) -> Vec<Detection> {
    if max_outputs == 0 || ranked.is_empty() {
        return Vec::new();
    }

    sort_ranked_desc(ranked);
    let mut suppressed = vec![false; ranked.len()];
    let mut kept = Vec::with_capacity(max_outputs.min(ranked.len()));

    for i in 0..ranked.len() {
        if suppressed[i] {
            continue;
        }
        let chosen = ranked[i].detection;
        kept.push(chosen);
        if kept.len() == max_outputs {
            break;
        }

        for (j, other) in ranked.iter().enumerate().skip(i + 1) {
            if suppressed[j] {
                continue;
            }
            if per_class && other.detection.class_id != chosen.class_id {
                continue;
            }
            if chosen.bbox.iou(&other.detection.bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    kept
}

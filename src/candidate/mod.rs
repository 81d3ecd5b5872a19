//! Detection values and deterministic candidate ranking.
//!
//! Includes the score-descending order shared by Top-K capping and
//! non-maximum suppression.

pub(crate) mod nms;
pub(crate) mod topk;

use crate::geometry::CornerBox;
use std::cmp::Ordering;

/// A scored, classified box in model input space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Corner-form box.
    pub bbox: CornerBox,
    /// Fused confidence used for ranking and thresholding.
    pub score: f32,
    /// Index into the label table.
    pub class_id: usize,
}

/// A detection tagged with its position in the list it came from.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ranked {
    pub index: usize,
    pub detection: Detection,
}

/// Orders by descending score, then ascending source index.
///
/// `total_cmp` keeps the order total even if a NaN slips through.
pub(crate) fn ranked_cmp_desc(a: &Ranked, b: &Ranked) -> Ordering {
    b.detection
        .score
        .total_cmp(&a.detection.score)
        .then_with(|| a.index.cmp(&b.index))
}

/// Sorts ranked detections best-first with deterministic tie-breaking.
pub(crate) fn sort_ranked_desc(items: &mut [Ranked]) {
    items.sort_by(ranked_cmp_desc);
}

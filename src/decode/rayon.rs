//! Rayon-parallel anchor decoding (feature-gated).
//!
//! Anchors are independent, so the tensor is split across worker threads.
//! The ordered collect keeps the output identical to the sequential path.

use crate::candidate::Ranked;
use crate::decode::DecodePlan;
use crate::tensor::TensorView;
use rayon::prelude::*;

/// Anchors handed to one worker at a time.
const MIN_ANCHORS_PER_TASK: usize = 512;

pub(crate) fn decode_ranked_par(tensor: &TensorView<'_>, plan: &DecodePlan) -> Vec<Ranked> {
    (0..tensor.anchors())
        .into_par_iter()
        .with_min_len(MIN_ANCHORS_PER_TASK)
        .filter_map(|anchor| {
            plan.decode_anchor(tensor, anchor)
                .map(|detection| Ranked {
                    index: anchor,
                    detection,
                })
        })
        .collect()
}

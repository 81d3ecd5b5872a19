//! Non-maximum suppression over decoded candidates.
//!
//! Suppression is greedy and single-pass: candidates above the score
//! threshold are ranked by descending score (ties by input position) and
//! each pick removes the remaining candidates it overlaps by more than the
//! IoU threshold. The suppression mode decides whether overlaps across
//! different classes count.

use crate::candidate::nms::greedy_nms;
use crate::candidate::{Detection, Ranked};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{check_not_nan, check_unit_interval};
use crate::util::DetPostResult;

/// Which candidate pairs are compared during suppression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Any two overlapping boxes compete regardless of class.
    #[default]
    ClassAgnostic,
    /// Only boxes of the same class compete.
    PerClass,
}

impl SuppressionMode {
    /// Stable lowercase name, used in logs and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionMode::ClassAgnostic => "class_agnostic",
            SuppressionMode::PerClass => "per_class",
        }
    }
}

/// Parameters for [`suppress`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuppressConfig {
    /// Pairs with IoU strictly above this are duplicates. Must be in [0, 1].
    pub iou_threshold: f32,
    /// Candidates at or below this score are discarded first.
    pub score_threshold: f32,
    /// Maximum number of detections returned.
    pub max_outputs: usize,
    /// Class-agnostic or per-class competition.
    pub mode: SuppressionMode,
}

impl Default for SuppressConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.45,
            score_threshold: 0.25,
            max_outputs: 300,
            mode: SuppressionMode::ClassAgnostic,
        }
    }
}

impl SuppressConfig {
    /// Checks threshold ranges.
    pub fn validate(&self) -> DetPostResult<()> {
        check_unit_interval("iou_threshold", self.iou_threshold)?;
        check_not_nan("score_threshold", self.score_threshold)?;
        Ok(())
    }
}

/// Removes duplicate detections and returns the survivors best-first.
///
/// Candidates with non-finite coordinates are discarded with the
/// low-scoring ones. The input is not modified. The output order is the
/// order of selection: descending score, ties resolved by lower input
/// position.
pub fn suppress(candidates: &[Detection], cfg: &SuppressConfig) -> DetPostResult<Vec<Detection>> {
    cfg.validate()?;
    let _span = trace_span!(
        "suppress",
        candidates = candidates.len(),
        mode = cfg.mode.as_str()
    )
    .entered();

    let mut ranked: Vec<Ranked> = candidates
        .iter()
        .enumerate()
        .filter(|(_, det)| det.score > cfg.score_threshold && det.bbox.is_finite())
        .map(|(index, det)| Ranked {
            index,
            detection: *det,
        })
        .collect();

    let kept = greedy_nms(
        &mut ranked,
        cfg.iou_threshold,
        cfg.max_outputs,
        cfg.mode == SuppressionMode::PerClass,
    );

    trace_event!("suppress_done", eligible = ranked.len(), kept = kept.len());
    Ok(kept)
}

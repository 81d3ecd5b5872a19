//! Decoding of raw detector tensors into scored candidates.
//!
//! Each anchor contributes at most one candidate: the class with the highest
//! fused confidence `objectness_act(obj) * class_act(logit)`, kept only when
//! that confidence is strictly above the score threshold. Boxes leave this
//! module in corner form; anchors with a non-finite box parameter are
//! skipped with a warning.
//!
//! Two score layouts are supported. `ClassOnly` heads (`C = 4 + K`) carry no
//! objectness channel and their fused confidence is the class activation
//! alone. `Objectness` heads (`C = 5 + K`) store objectness in channel 4.

pub mod activation;
#[cfg(feature = "rayon")]
pub(crate) mod rayon;

pub use activation::{Activation, ActivationConfig};

use crate::candidate::topk::cap_in_source_order;
use crate::candidate::{Detection, Ranked};
use crate::geometry::{CenterBox, CornerBox};
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::check_not_nan;
use crate::util::{DetPostResult, ShapeError};
use activation::SoftmaxNorm;

/// Number of box parameters at the start of every anchor column.
pub const BOX_CHANNELS: usize = 4;

/// Arrangement of score channels after the four box parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreLayout {
    /// `[box(4), class(K)]`, as exported by anchor-free heads.
    #[default]
    ClassOnly,
    /// `[box(4), objectness, class(K)]`.
    Objectness,
}

impl ScoreLayout {
    /// Index of the first class channel.
    pub fn class_start(&self) -> usize {
        match self {
            ScoreLayout::ClassOnly => BOX_CHANNELS,
            ScoreLayout::Objectness => BOX_CHANNELS + 1,
        }
    }

    /// Smallest channel count that leaves room for one class.
    pub fn min_channels(&self) -> usize {
        self.class_start() + 1
    }

    /// Number of classes `K` encoded by a `channels`-wide tensor.
    pub fn class_count(&self, channels: usize) -> Option<usize> {
        if channels < self.min_channels() {
            return None;
        }
        Some(channels - self.class_start())
    }
}

/// Meaning of the four box channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoxEncoding {
    /// `cx, cy, w, h` in model input pixels.
    #[default]
    CenterSize,
    /// `x1, y1, x2, y2` in model input pixels.
    Corners,
}

/// Decoder configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeConfig {
    /// Anchors whose best fused confidence is not strictly above this are dropped.
    pub score_threshold: f32,
    /// Score channel arrangement.
    pub layout: ScoreLayout,
    /// Box channel arrangement.
    pub boxes: BoxEncoding,
    /// Objectness and class activations.
    pub activation: ActivationConfig,
    /// Keep only the best candidates before suppression.
    pub max_candidates: Option<usize>,
    /// Decode anchors in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.25,
            layout: ScoreLayout::ClassOnly,
            boxes: BoxEncoding::CenterSize,
            activation: ActivationConfig::default(),
            max_candidates: None,
            parallel: false,
        }
    }
}

impl DecodeConfig {
    /// Checks thresholds and activation support.
    pub fn validate(&self) -> DetPostResult<()> {
        check_not_nan("score_threshold", self.score_threshold)?;
        self.activation.validate()?;
        Ok(())
    }
}

/// Validated per-call decode parameters.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodePlan {
    threshold: f32,
    objectness: Option<(usize, Activation)>,
    class_start: usize,
    num_classes: usize,
    class_act: Activation,
    boxes: BoxEncoding,
}

impl DecodePlan {
    pub fn new(tensor: &TensorView<'_>, cfg: &DecodeConfig) -> DetPostResult<Self> {
        cfg.validate()?;
        let channels = tensor.channels();
        let num_classes = cfg
            .layout
            .class_count(channels)
            .ok_or(ShapeError::TooFewChannels {
                channels,
                min: cfg.layout.min_channels(),
            })?;
        let objectness = match cfg.layout {
            ScoreLayout::ClassOnly => None,
            ScoreLayout::Objectness => Some((BOX_CHANNELS, cfg.activation.objectness)),
        };
        Ok(Self {
            threshold: cfg.score_threshold,
            objectness,
            class_start: cfg.layout.class_start(),
            num_classes,
            class_act: cfg.activation.class,
            boxes: cfg.boxes,
        })
    }

    /// Decodes one anchor, returning a candidate if it clears the threshold.
    #[inline]
    pub fn decode_anchor(&self, tensor: &TensorView<'_>, anchor: usize) -> Option<Detection> {
        let obj = match self.objectness {
            // Identity and sigmoid are the only objectness activations a
            // validated plan can hold.
            Some((channel, act)) => act.apply_scalar(tensor.at(channel, anchor))?,
            None => 1.0,
        };

        let logit = |c: usize| tensor.at(self.class_start + c, anchor);
        let norm = match self.class_act {
            Activation::Softmax => Some(SoftmaxNorm::from_logits(self.num_classes, &logit)),
            _ => None,
        };

        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..self.num_classes {
            let raw = logit(c);
            let prob = match &norm {
                Some(norm) => norm.prob(raw),
                None => self.class_act.apply_scalar(raw)?,
            };
            let confidence = obj * prob;
            // Ties keep the lower class; NaN never wins.
            if confidence > best_score {
                best_score = confidence;
                best_class = c;
            }
        }

        if best_score <= self.threshold {
            return None;
        }

        let p0 = tensor.at(0, anchor);
        let p1 = tensor.at(1, anchor);
        let p2 = tensor.at(2, anchor);
        let p3 = tensor.at(3, anchor);
        if !(p0.is_finite() && p1.is_finite() && p2.is_finite() && p3.is_finite()) {
            trace_warn!("non_finite_box", anchor = anchor, class_id = best_class);
            return None;
        }
        let bbox = match self.boxes {
            BoxEncoding::CenterSize => CenterBox {
                cx: p0,
                cy: p1,
                w: p2,
                h: p3,
            }
            .to_corners(),
            BoxEncoding::Corners => CornerBox::from_points(p0, p1, p2, p3),
        };

        Some(Detection {
            bbox,
            score: best_score,
            class_id: best_class,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

/// Decodes every anchor of `tensor` into candidates, in anchor order.
///
/// Fails with a shape error when the tensor has fewer channels than the
/// layout needs for one class, and with a config error for a NaN threshold
/// or an unsupported activation. The tensor is only read.
pub fn decode(tensor: TensorView<'_>, cfg: &DecodeConfig) -> DetPostResult<Vec<Detection>> {
    let plan = DecodePlan::new(&tensor, cfg)?;
    let _span = trace_span!(
        "decode",
        anchors = tensor.anchors(),
        classes = plan.num_classes()
    )
    .entered();

    let mut ranked = decode_ranked(&tensor, &plan, cfg.parallel);
    if let Some(limit) = cfg.max_candidates {
        ranked = cap_in_source_order(ranked, limit);
    }

    trace_event!("decode_candidates", count = ranked.len());
    Ok(ranked.into_iter().map(|r| r.detection).collect())
}

#[cfg(feature = "rayon")]
fn decode_ranked(tensor: &TensorView<'_>, plan: &DecodePlan, parallel: bool) -> Vec<Ranked> {
    if parallel {
        return self::rayon::decode_ranked_par(tensor, plan);
    }
    decode_ranked_seq(tensor, plan)
}

#[cfg(not(feature = "rayon"))]
fn decode_ranked(tensor: &TensorView<'_>, plan: &DecodePlan, _parallel: bool) -> Vec<Ranked> {
    decode_ranked_seq(tensor, plan)
}

fn decode_ranked_seq(tensor: &TensorView<'_>, plan: &DecodePlan) -> Vec<Ranked> {
    (0..tensor.anchors())
        .filter_map(|anchor| {
            plan.decode_anchor(tensor, anchor)
                .map(|detection| Ranked {
                    index: anchor,
                    detection,
                })
        })
        .collect()
}

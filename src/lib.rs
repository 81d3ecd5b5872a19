//! detpost turns raw object-detector output tensors into final detections.
//!
//! The pipeline has two independent stages. [`decode`] reads a `[1, C, N]`
//! tensor through a strided [`TensorView`], fuses objectness and class
//! confidences with configurable activations and keeps anchors strictly
//! above a score threshold. [`suppress`] runs greedy IoU non-maximum
//! suppression, class-agnostic or per class, capped at a maximum output
//! count. [`Postprocessor`] wires both stages to a label table.
//!
//! Boxes stay in model input space; mapping them onto a display surface is
//! left to the caller (see [`DisplayScale`]). Anchor decoding can run in
//! parallel with the `rayon` feature; spans and events are emitted with the
//! `tracing` feature.

mod candidate;
pub mod decode;
pub mod geometry;
pub mod lowlevel;
pub mod pipeline;
pub mod suppress;
pub mod tensor;
mod trace;
pub mod util;

pub use candidate::Detection;
pub use decode::{decode, Activation, ActivationConfig, BoxEncoding, DecodeConfig, ScoreLayout};
pub use geometry::{CenterBox, CornerBox, DisplayScale};
pub use pipeline::{LabeledDetection, PostprocessConfig, PostprocessOutput, Postprocessor};
pub use suppress::{suppress, SuppressConfig, SuppressionMode};
pub use tensor::{AxisOrder, TensorShape, TensorView};
pub use util::{ConfigError, DetPostError, DetPostResult, IndexAnomaly, ShapeError};

//! Error types for detpost.

use std::fmt;
use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors that abort a decode or suppress call.
///
/// Both kinds signal a caller contract violation rather than a data
/// condition, so the whole invocation fails.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DetPostError {
    /// The tensor dimensions are malformed or incompatible with the layout.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
    /// A threshold or activation setting is out of range or unsupported.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Malformed or incompatible tensor dimensions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// Only a single batch entry is supported.
    #[error("batch dimension must be 1, got {batch}")]
    UnsupportedBatch { batch: usize },
    /// The tensor has no anchors.
    #[error("tensor has zero anchors")]
    NoAnchors,
    /// Not enough channels for the box parameters plus one class.
    #[error("{channels} channels leave no room for a class (need at least {min})")]
    TooFewChannels { channels: usize, min: usize },
    /// The backing buffer is shorter than the declared shape.
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The declared shape overflows `usize`.
    #[error("shape {channels}x{anchors} overflows")]
    Overflow { channels: usize, anchors: usize },
}

/// Out-of-range thresholds or unsupported settings.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A threshold is NaN or outside its allowed range.
    #[error("{name} = {value} is out of range")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    /// The activation cannot be used in the requested role.
    #[error("activation '{kind}' is not supported for {role}")]
    UnsupportedActivation { role: &'static str, kind: String },
    /// The label table has no entries.
    #[error("label table is empty")]
    EmptyLabelTable,
    /// A size used for coordinate mapping is not positive.
    #[error("{name} must be positive, got {value}")]
    NonPositiveSize { name: &'static str, value: f32 },
}

/// A recovered per-detection problem: the class index has no label.
///
/// The offending candidate is dropped and the call continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexAnomaly {
    /// Position of the candidate in the decoder output.
    pub candidate: usize,
    /// Decoded class index.
    pub class_id: usize,
    /// Length of the label table.
    pub label_count: usize,
}

impl fmt::Display for IndexAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidate {} has class {} outside label table of {}",
            self.candidate, self.class_id, self.label_count
        )
    }
}

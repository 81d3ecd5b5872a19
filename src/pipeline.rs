//! Configured decode → label check → suppress pipeline.
//!
//! `Postprocessor` is the in-process boundary used by hosts: it takes a raw
//! tensor view and returns labeled detections in model input space together
//! with the anomalies that were recovered along the way.

use crate::candidate::Detection;
use crate::decode::{decode, DecodeConfig};
use crate::suppress::{suppress, SuppressConfig, SuppressionMode};
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{ConfigError, DetPostResult, IndexAnomaly};

/// Full pipeline configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct PostprocessConfig {
    pub decode: DecodeConfig,
    pub suppress: SuppressConfig,
    /// Human-readable class names indexed by class id.
    pub labels: Vec<String>,
}

impl PostprocessConfig {
    /// Creates a config with default thresholds for the given label table.
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            decode: DecodeConfig::default(),
            suppress: SuppressConfig::default(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates both stages and the label table.
    pub fn validate(&self) -> DetPostResult<()> {
        self.decode.validate()?;
        self.suppress.validate()?;
        if self.labels.is_empty() {
            return Err(ConfigError::EmptyLabelTable.into());
        }
        Ok(())
    }
}

/// A final detection with its resolved label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledDetection<'a> {
    pub detection: Detection,
    pub label: &'a str,
}

/// Result of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostprocessOutput<'a> {
    /// Final detections in selection order.
    pub detections: Vec<LabeledDetection<'a>>,
    /// Candidates dropped because their class had no label.
    pub anomalies: Vec<IndexAnomaly>,
}

/// Decoder and suppressor bound to a validated configuration.
#[derive(Clone, Debug)]
pub struct Postprocessor {
    cfg: PostprocessConfig,
}

impl Postprocessor {
    /// Validates `cfg` and builds the pipeline.
    pub fn new(cfg: PostprocessConfig) -> DetPostResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PostprocessConfig {
        &self.cfg
    }

    /// Returns the active suppression mode.
    pub fn suppression_mode(&self) -> SuppressionMode {
        self.cfg.suppress.mode
    }

    /// Returns the label for `class_id`, if the table has one.
    pub fn label(&self, class_id: usize) -> Option<&str> {
        self.cfg.labels.get(class_id).map(String::as_str)
    }

    /// Runs decode, drops unlabeled candidates, then suppresses duplicates.
    ///
    /// Unlabeled candidates are removed before suppression so they cannot
    /// displace a valid overlapping detection.
    pub fn run(&self, tensor: TensorView<'_>) -> DetPostResult<PostprocessOutput<'_>> {
        let _span = trace_span!(
            "postprocess",
            mode = self.cfg.suppress.mode.as_str()
        )
        .entered();

        let candidates = decode(tensor, &self.cfg.decode)?;
        let (candidates, anomalies) = self.drop_unlabeled(candidates);
        let kept = suppress(&candidates, &self.cfg.suppress)?;

        let mut detections = Vec::with_capacity(kept.len());
        for detection in kept {
            // Every survivor passed the label check above.
            if let Some(label) = self.label(detection.class_id) {
                detections.push(LabeledDetection { detection, label });
            }
        }

        trace_event!(
            "postprocess_done",
            detections = detections.len(),
            anomalies = anomalies.len()
        );
        Ok(PostprocessOutput {
            detections,
            anomalies,
        })
    }

    fn drop_unlabeled(&self, candidates: Vec<Detection>) -> (Vec<Detection>, Vec<IndexAnomaly>) {
        let label_count = self.cfg.labels.len();
        let mut anomalies = Vec::new();
        let mut kept = Vec::with_capacity(candidates.len());
        for (candidate, detection) in candidates.into_iter().enumerate() {
            if detection.class_id < label_count {
                kept.push(detection);
                continue;
            }
            trace_warn!(
                "class_index_anomaly",
                candidate = candidate,
                class_id = detection.class_id,
                label_count = label_count
            );
            anomalies.push(IndexAnomaly {
                candidate,
                class_id: detection.class_id,
                label_count,
            });
        }
        (kept, anomalies)
    }
}

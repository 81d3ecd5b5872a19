//! Python bindings for the detpost post-processing pipeline.
//!
//! This module exposes the high-level detpost API to Python via PyO3.

use numpy::{PyReadonlyArray3, PyUntypedArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use detpost::{
    Activation, ActivationConfig, AxisOrder, BoxEncoding, CornerBox, DecodeConfig, DetPostError,
    LabeledDetection, PostprocessConfig, Postprocessor as RustPostprocessor, ScoreLayout,
    SuppressConfig, SuppressionMode, TensorShape, TensorView,
};

/// Convert a DetPostError to a Python exception.
fn to_py_err(err: DetPostError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_activation(name: &str) -> PyResult<Activation> {
    name.parse::<Activation>()
        .map_err(|err| PyValueError::new_err(err.to_string()))
}

fn parse_layout(name: &str) -> PyResult<ScoreLayout> {
    match name.to_lowercase().as_str() {
        "class_only" => Ok(ScoreLayout::ClassOnly),
        "objectness" => Ok(ScoreLayout::Objectness),
        _ => Err(PyValueError::new_err(
            "layout must be 'class_only' or 'objectness'",
        )),
    }
}

fn parse_boxes(name: &str) -> PyResult<BoxEncoding> {
    match name.to_lowercase().as_str() {
        "center_size" | "cxcywh" => Ok(BoxEncoding::CenterSize),
        "corners" | "xyxy" => Ok(BoxEncoding::Corners),
        _ => Err(PyValueError::new_err(
            "boxes must be 'center_size' or 'corners'",
        )),
    }
}

fn parse_mode(name: &str) -> PyResult<SuppressionMode> {
    match name.to_lowercase().as_str() {
        "class_agnostic" => Ok(SuppressionMode::ClassAgnostic),
        "per_class" => Ok(SuppressionMode::PerClass),
        _ => Err(PyValueError::new_err(
            "suppression must be 'class_agnostic' or 'per_class'",
        )),
    }
}

fn parse_axis_order(name: &str) -> PyResult<AxisOrder> {
    match name.to_lowercase().as_str() {
        "channels_first" => Ok(AxisOrder::ChannelsFirst),
        "anchors_first" => Ok(AxisOrder::AnchorsFirst),
        _ => Err(PyValueError::new_err(
            "axis_order must be 'channels_first' or 'anchors_first'",
        )),
    }
}

fn non_negative(name: &str, value: i64) -> PyResult<usize> {
    usize::try_from(value)
        .map_err(|_| PyValueError::new_err(format!("{name} must be non-negative, got {value}")))
}

/// Final detection in model input coordinates.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    #[pyo3(get)]
    pub x1: f32,
    #[pyo3(get)]
    pub y1: f32,
    #[pyo3(get)]
    pub x2: f32,
    #[pyo3(get)]
    pub y2: f32,
    /// Fused confidence.
    #[pyo3(get)]
    pub score: f32,
    #[pyo3(get)]
    pub class_id: usize,
    #[pyo3(get)]
    pub label: String,
}

#[pymethods]
impl Detection {
    /// Box as an `(x1, y1, x2, y2)` tuple.
    #[getter]
    fn xyxy(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    fn __repr__(&self) -> String {
        format!(
            "Detection(label='{}', score={:.4}, box=({:.1}, {:.1}, {:.1}, {:.1}))",
            self.label, self.score, self.x1, self.y1, self.x2, self.y2
        )
    }
}

impl From<&LabeledDetection<'_>> for Detection {
    fn from(d: &LabeledDetection<'_>) -> Self {
        let bbox = d.detection.bbox;
        Self {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
            score: d.detection.score,
            class_id: d.detection.class_id,
            label: d.label.to_string(),
        }
    }
}

/// Decoder and suppressor bound to a label table.
#[pyclass]
pub struct Postprocessor {
    inner: RustPostprocessor,
    axis_order: AxisOrder,
}

impl Postprocessor {
    fn run_array(
        &self,
        tensor: PyReadonlyArray3<'_, f32>,
    ) -> PyResult<(Vec<Detection>, Vec<String>)> {
        let shape = tensor.shape();
        let dims = [shape[0], shape[1], shape[2]];
        let data = tensor.as_slice()?;

        let view = TensorView::new(data, TensorShape::from_dims(dims, self.axis_order), self.axis_order)
            .map_err(to_py_err)?;
        let out = self.inner.run(view).map_err(to_py_err)?;
        let detections = out.detections.iter().map(Detection::from).collect();
        let anomalies = out.anomalies.iter().map(|a| a.to_string()).collect();
        Ok((detections, anomalies))
    }
}

#[pymethods]
impl Postprocessor {
    /// Create a new Postprocessor.
    ///
    /// Args:
    ///     labels: Class names indexed by class id
    ///     score_threshold: Decoder and suppressor score cutoff, strict (default: 0.25)
    ///     iou_threshold: Duplicate IoU cutoff in [0, 1], strict (default: 0.45)
    ///     max_outputs: Maximum detections returned (default: 300)
    ///     layout: "class_only" or "objectness" (default: "class_only")
    ///     boxes: "center_size" or "corners" (default: "center_size")
    ///     objectness_activation: "identity" or "sigmoid" (default: "identity")
    ///     class_activation: "identity", "sigmoid" or "softmax" (default: "identity")
    ///     suppression: "class_agnostic" or "per_class" (default: "class_agnostic")
    ///     axis_order: "channels_first" or "anchors_first" (default: "channels_first")
    ///     max_candidates: Optional pre-suppression cap (default: None)
    ///     parallel: Decode anchors in parallel (default: False)
    #[new]
    #[pyo3(signature = (
        labels,
        score_threshold = 0.25,
        iou_threshold = 0.45,
        max_outputs = 300,
        layout = "class_only",
        boxes = "center_size",
        objectness_activation = "identity",
        class_activation = "identity",
        suppression = "class_agnostic",
        axis_order = "channels_first",
        max_candidates = None,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        labels: Vec<String>,
        score_threshold: f32,
        iou_threshold: f32,
        max_outputs: i64,
        layout: &str,
        boxes: &str,
        objectness_activation: &str,
        class_activation: &str,
        suppression: &str,
        axis_order: &str,
        max_candidates: Option<i64>,
        parallel: bool,
    ) -> PyResult<Self> {
        let max_candidates = max_candidates
            .map(|v| non_negative("max_candidates", v))
            .transpose()?;
        let cfg = PostprocessConfig {
            decode: DecodeConfig {
                score_threshold,
                layout: parse_layout(layout)?,
                boxes: parse_boxes(boxes)?,
                activation: ActivationConfig {
                    objectness: parse_activation(objectness_activation)?,
                    class: parse_activation(class_activation)?,
                },
                max_candidates,
                parallel,
            },
            suppress: SuppressConfig {
                iou_threshold,
                score_threshold,
                max_outputs: non_negative("max_outputs", max_outputs)?,
                mode: parse_mode(suppression)?,
            },
            labels,
        };
        let inner = RustPostprocessor::new(cfg).map_err(to_py_err)?;
        Ok(Self {
            inner,
            axis_order: parse_axis_order(axis_order)?,
        })
    }

    /// Post-process a raw detector output.
    ///
    /// Args:
    ///     tensor: 3D float32 numpy array shaped (1, C, N), or (1, N, C) for
    ///         axis_order="anchors_first"
    ///
    /// Returns:
    ///     Tuple of (detections, anomalies); anomalies describe candidates
    ///     dropped because their class had no label
    fn run(
        &self,
        tensor: PyReadonlyArray3<'_, f32>,
    ) -> PyResult<(Vec<Detection>, Vec<String>)> {
        self.run_array(tensor)
    }

    /// Active suppression mode name.
    #[getter]
    fn suppression_mode(&self) -> &'static str {
        self.inner.suppression_mode().as_str()
    }

    fn __repr__(&self) -> String {
        let cfg = self.inner.config();
        format!(
            "Postprocessor(classes={}, score_threshold={}, iou_threshold={}, max_outputs={}, suppression='{}')",
            cfg.labels.len(),
            cfg.decode.score_threshold,
            cfg.suppress.iou_threshold,
            cfg.suppress.max_outputs,
            cfg.suppress.mode.as_str()
        )
    }
}

/// Convenience function running the default pipeline on a `(1, C, N)` tensor.
///
/// For repeated calls with the same settings, build a Postprocessor once.
///
/// Args:
///     tensor: 3D float32 numpy array shaped (1, C, N)
///     labels: Class names indexed by class id
///     score_threshold: Score cutoff (default: 0.25)
///     iou_threshold: IoU cutoff (default: 0.45)
///     max_outputs: Maximum detections returned (default: 300)
///
/// Returns:
///     List of Detection objects, best first
#[pyfunction]
#[pyo3(signature = (tensor, labels, score_threshold = 0.25, iou_threshold = 0.45, max_outputs = 300))]
fn postprocess(
    tensor: PyReadonlyArray3<'_, f32>,
    labels: Vec<String>,
    score_threshold: f32,
    iou_threshold: f32,
    max_outputs: i64,
) -> PyResult<Vec<Detection>> {
    let mut cfg = PostprocessConfig::with_labels(labels);
    cfg.decode.score_threshold = score_threshold;
    cfg.suppress.score_threshold = score_threshold;
    cfg.suppress.iou_threshold = iou_threshold;
    cfg.suppress.max_outputs = non_negative("max_outputs", max_outputs)?;
    let post = Postprocessor {
        inner: RustPostprocessor::new(cfg).map_err(to_py_err)?,
        axis_order: AxisOrder::ChannelsFirst,
    };
    let (detections, _) = post.run_array(tensor)?;
    Ok(detections)
}

/// Intersection-over-union of two `(x1, y1, x2, y2)` boxes.
#[pyfunction]
fn iou(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> f32 {
    let a = CornerBox::from_points(a.0, a.1, a.2, a.3);
    let b = CornerBox::from_points(b.0, b.1, b.2, b.3);
    a.iou(&b)
}

/// Python module for detpost.
#[pymodule]
fn _detpost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<Postprocessor>()?;
    m.add_function(wrap_pyfunction!(postprocess, m)?)?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

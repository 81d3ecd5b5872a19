use clap::Parser;
use detpost::{
    Activation, ActivationConfig, AxisOrder, BoxEncoding, CornerBox, DecodeConfig, DisplayScale,
    IndexAnomaly, LabeledDetection, PostprocessConfig, Postprocessor, ScoreLayout, SuppressConfig,
    SuppressionMode, TensorShape, TensorView,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Detection post-processing CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the decode and suppress stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TensorFormat {
    /// Raw little-endian `f32` values, as dumped from an inference engine.
    #[default]
    F32Le,
    /// A flat JSON array of numbers.
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AxisOrderConfig {
    #[default]
    ChannelsFirst,
    AnchorsFirst,
}

impl From<AxisOrderConfig> for AxisOrder {
    fn from(value: AxisOrderConfig) -> Self {
        match value {
            AxisOrderConfig::ChannelsFirst => AxisOrder::ChannelsFirst,
            AxisOrderConfig::AnchorsFirst => AxisOrder::AnchorsFirst,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    #[default]
    ClassOnly,
    Objectness,
}

impl From<LayoutConfig> for ScoreLayout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::ClassOnly => ScoreLayout::ClassOnly,
            LayoutConfig::Objectness => ScoreLayout::Objectness,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BoxEncodingConfig {
    #[default]
    CenterSize,
    Corners,
}

impl From<BoxEncodingConfig> for BoxEncoding {
    fn from(value: BoxEncodingConfig) -> Self {
        match value {
            BoxEncodingConfig::CenterSize => BoxEncoding::CenterSize,
            BoxEncodingConfig::Corners => BoxEncoding::Corners,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionModeConfig {
    #[default]
    ClassAgnostic,
    PerClass,
}

impl From<SuppressionModeConfig> for SuppressionMode {
    fn from(value: SuppressionModeConfig) -> Self {
        match value {
            SuppressionModeConfig::ClassAgnostic => SuppressionMode::ClassAgnostic,
            SuppressionModeConfig::PerClass => SuppressionMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DecodeConfigJson {
    score_threshold: f32,
    layout: LayoutConfig,
    boxes: BoxEncodingConfig,
    objectness_activation: String,
    class_activation: String,
    max_candidates: Option<usize>,
    parallel: bool,
}

impl Default for DecodeConfigJson {
    fn default() -> Self {
        let cfg = DecodeConfig::default();
        Self {
            score_threshold: cfg.score_threshold,
            layout: LayoutConfig::default(),
            boxes: BoxEncodingConfig::default(),
            objectness_activation: cfg.activation.objectness.to_string(),
            class_activation: cfg.activation.class.to_string(),
            max_candidates: cfg.max_candidates,
            parallel: cfg.parallel,
        }
    }
}

impl DecodeConfigJson {
    fn into_config(self) -> Result<DecodeConfig, Box<dyn std::error::Error>> {
        let objectness: Activation = self.objectness_activation.parse()?;
        let class: Activation = self.class_activation.parse()?;
        Ok(DecodeConfig {
            score_threshold: self.score_threshold,
            layout: self.layout.into(),
            boxes: self.boxes.into(),
            activation: ActivationConfig { objectness, class },
            max_candidates: self.max_candidates,
            parallel: self.parallel,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SuppressConfigJson {
    iou_threshold: f32,
    score_threshold: f32,
    max_outputs: usize,
    mode: SuppressionModeConfig,
}

impl Default for SuppressConfigJson {
    fn default() -> Self {
        let cfg = SuppressConfig::default();
        Self {
            iou_threshold: cfg.iou_threshold,
            score_threshold: cfg.score_threshold,
            max_outputs: cfg.max_outputs,
            mode: SuppressionModeConfig::default(),
        }
    }
}

impl From<SuppressConfigJson> for SuppressConfig {
    fn from(value: SuppressConfigJson) -> Self {
        Self {
            iou_threshold: value.iou_threshold,
            score_threshold: value.score_threshold,
            max_outputs: value.max_outputs,
            mode: value.mode.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    tensor_format: TensorFormat,
    /// Dimensions as stored in memory: `[1, C, N]` or `[1, N, C]`.
    shape: [usize; 3],
    axis_order: AxisOrderConfig,
    labels: Vec<String>,
    labels_path: Option<String>,
    /// Model input `[width, height]`; set together with `display_size`.
    model_size: Option<[f32; 2]>,
    /// Display surface `[width, height]` for mapped boxes; set together with `model_size`.
    display_size: Option<[f32; 2]>,
    output_path: Option<String>,
    decode: DecodeConfigJson,
    suppress: SuppressConfigJson,
}

#[derive(Debug, Serialize)]
struct BoxRecord {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl From<CornerBox> for BoxRecord {
    fn from(value: CornerBox) -> Self {
        Self {
            x1: value.x1,
            y1: value.y1,
            x2: value.x2,
            y2: value.y2,
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_id: usize,
    score: f32,
    #[serde(rename = "box")]
    bbox: BoxRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_box: Option<BoxRecord>,
}

impl DetectionRecord {
    fn new(value: &LabeledDetection<'_>, scale: Option<&DisplayScale>) -> Self {
        let det = value.detection;
        Self {
            label: value.label.to_string(),
            class_id: det.class_id,
            score: det.score,
            bbox: det.bbox.into(),
            display_box: scale.map(|s| s.map_box(&det.bbox).into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnomalyRecord {
    candidate: usize,
    class_id: usize,
    label_count: usize,
    message: String,
}

impl From<IndexAnomaly> for AnomalyRecord {
    fn from(value: IndexAnomaly) -> Self {
        Self {
            candidate: value.candidate,
            class_id: value.class_id,
            label_count: value.label_count,
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    suppression_mode: &'static str,
    detections: Vec<DetectionRecord>,
    anomalies: Vec<AnomalyRecord>,
}

fn load_tensor(path: &Path, format: &TensorFormat) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    match format {
        TensorFormat::F32Le => {
            let bytes = fs::read(path)?;
            if bytes.len() % 4 != 0 {
                return Err(format!(
                    "tensor file {} has {} bytes, not a multiple of 4",
                    path.display(),
                    bytes.len()
                )
                .into());
            }
            Ok(bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect())
        }
        TensorFormat::Json => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

fn load_labels(config: &Config) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    match &config.labels_path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect())
        }
        None => Ok(config.labels.clone()),
    }
}

fn display_scale(config: &Config) -> Result<Option<DisplayScale>, Box<dyn std::error::Error>> {
    match (config.model_size, config.display_size) {
        (Some([mw, mh]), Some([dw, dh])) => Ok(Some(DisplayScale::new(mw, mh, dw, dh)?)),
        (None, Some(_)) => Err("display_size requires model_size".into()),
        (Some(_), None) => Err("model_size requires display_size".into()),
        (None, None) => Ok(None),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let labels = load_labels(&config)?;
    let scale = display_scale(&config)?;
    let data = load_tensor(Path::new(&config.tensor_path), &config.tensor_format)?;
    let order = AxisOrder::from(config.axis_order);
    let shape = TensorShape::from_dims(config.shape, order);
    info!(
        channels = shape.channels,
        anchors = shape.anchors,
        values = data.len(),
        "loaded tensor"
    );

    let post = Postprocessor::new(PostprocessConfig {
        decode: config.decode.into_config()?,
        suppress: config.suppress.into(),
        labels,
    })?;

    let view = TensorView::new(&data, shape, order)?;
    let result = post.run(view)?;

    let output = Output {
        suppression_mode: post.suppression_mode().as_str(),
        detections: result
            .detections
            .iter()
            .map(|d| DetectionRecord::new(d, scale.as_ref()))
            .collect(),
        anomalies: result.anomalies.into_iter().map(AnomalyRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

//! Integration tests driven by hand-checked tensor fixtures.
//!
//! Each case lists per-anchor columns, the thresholds to use and the
//! detections the full pipeline must return, in order.

use detpost::{PostprocessConfig, Postprocessor, ScoreLayout, TensorView};
use serde::Deserialize;

/// Score tolerance for products of decimal fixtures.
const SCORE_TOLERANCE: f32 = 1e-5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutJson {
    ClassOnly,
    Objectness,
}

#[derive(Debug, Deserialize)]
struct Expected {
    label: String,
    score: f32,
    #[serde(rename = "box")]
    bbox: [f32; 4],
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    layout: LayoutJson,
    labels: Vec<String>,
    anchors: Vec<Vec<f32>>,
    score_threshold: f32,
    iou_threshold: f32,
    expected: Vec<Expected>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    cases: Vec<Case>,
}

fn channels_first(anchors: &[Vec<f32>]) -> (Vec<f32>, usize, usize) {
    let n = anchors.len();
    let c = anchors[0].len();
    let mut data = vec![0.0f32; c * n];
    for (i, column) in anchors.iter().enumerate() {
        for (ch, &value) in column.iter().enumerate() {
            data[ch * n + i] = value;
        }
    }
    (data, c, n)
}

fn run_case(case: &Case) {
    let (data, c, n) = channels_first(&case.anchors);
    let view = TensorView::channels_first(&data, c, n).unwrap();

    let mut cfg = PostprocessConfig::with_labels(case.labels.iter().cloned());
    cfg.decode.layout = match case.layout {
        LayoutJson::ClassOnly => ScoreLayout::ClassOnly,
        LayoutJson::Objectness => ScoreLayout::Objectness,
    };
    cfg.decode.score_threshold = case.score_threshold;
    cfg.suppress.score_threshold = case.score_threshold;
    cfg.suppress.iou_threshold = case.iou_threshold;

    let post = Postprocessor::new(cfg).unwrap();
    let out = post.run(view).unwrap();
    assert!(out.anomalies.is_empty(), "{}: unexpected anomalies", case.case_id);
    assert_eq!(
        out.detections.len(),
        case.expected.len(),
        "{}: detection count",
        case.case_id
    );

    for (got, want) in out.detections.iter().zip(case.expected.iter()) {
        assert_eq!(got.label, want.label, "{}: label", case.case_id);
        assert!(
            (got.detection.score - want.score).abs() < SCORE_TOLERANCE,
            "{}: expected score {}, got {}",
            case.case_id,
            want.score,
            got.detection.score
        );
        let b = got.detection.bbox;
        assert_eq!(
            [b.x1, b.y1, b.x2, b.y2],
            want.bbox,
            "{}: box",
            case.case_id
        );
    }
}

#[test]
fn fixture_cases_match_expected_detections() {
    let text = include_str!("data/cases.json");
    let manifest: Manifest = serde_json::from_str(text).expect("Failed to parse cases");
    assert!(!manifest.cases.is_empty());
    for case in &manifest.cases {
        run_case(case);
    }
}

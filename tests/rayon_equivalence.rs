#![cfg(feature = "rayon")]

use detpost::{
    decode, Activation, ActivationConfig, DecodeConfig, PostprocessConfig, Postprocessor,
    ScoreLayout, TensorView,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random channels-first head with plausible box ranges.
fn make_head(channels: usize, anchors: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0.0f32; channels * anchors];
    for ch in 0..channels {
        let row = &mut data[ch * anchors..(ch + 1) * anchors];
        for value in row.iter_mut() {
            *value = match ch {
                0 | 1 => rng.random_range(0.0..640.0),
                2 | 3 => rng.random_range(4.0..120.0),
                _ => rng.random_range(-5.0..5.0),
            };
        }
    }
    data
}

#[test]
fn parallel_decode_matches_sequential() {
    let channels = 85;
    let anchors = 4200;
    let data = make_head(channels, anchors, 5);
    let view = TensorView::channels_first(&data, channels, anchors).unwrap();

    let base = DecodeConfig {
        score_threshold: 0.3,
        layout: ScoreLayout::Objectness,
        activation: ActivationConfig {
            objectness: Activation::Sigmoid,
            class: Activation::Sigmoid,
        },
        ..DecodeConfig::default()
    };
    let sequential = decode(view, &base).unwrap();
    let parallel = decode(
        view,
        &DecodeConfig {
            parallel: true,
            ..base
        },
    )
    .unwrap();
    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);

    let capped = DecodeConfig {
        max_candidates: Some(100),
        ..base
    };
    let sequential = decode(view, &capped).unwrap();
    let parallel = decode(
        view,
        &DecodeConfig {
            parallel: true,
            ..capped
        },
    )
    .unwrap();
    assert_eq!(sequential.len(), 100);
    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_pipeline_matches_sequential() {
    let channels = 84;
    let anchors = 2100;
    let data = make_head(channels, anchors, 9);
    let view = TensorView::channels_first(&data, channels, anchors).unwrap();
    let labels: Vec<String> = (0..80).map(|i| format!("class{i}")).collect();

    let mut cfg = PostprocessConfig::with_labels(labels);
    cfg.decode.activation.class = Activation::Sigmoid;
    let sequential = Postprocessor::new(cfg.clone()).unwrap();
    cfg.decode.parallel = true;
    let parallel = Postprocessor::new(cfg).unwrap();

    let a = sequential.run(view).unwrap();
    let b = parallel.run(view).unwrap();
    assert!(!a.detections.is_empty());
    assert_eq!(a.detections, b.detections);
}

use detpost::{
    decode, suppress, Activation, DecodeConfig, PostprocessConfig, Postprocessor, SuppressConfig,
    SuppressionMode, TensorView,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// Deterministic 84 x 8400 head resembling a 640 x 640 COCO export.
fn make_head(channels: usize, anchors: usize) -> Vec<f32> {
    let mut data = vec![0.0f32; channels * anchors];
    for ch in 0..channels {
        for i in 0..anchors {
            let hash = ((i * 2654435761) ^ (ch * 40503)) & 0xFFFF;
            let unit = hash as f32 / 65535.0;
            data[ch * anchors + i] = match ch {
                0 | 1 => unit * 640.0,
                2 | 3 => 8.0 + unit * 96.0,
                _ => unit * 8.0 - 6.0,
            };
        }
    }
    data
}

fn bench_pipeline(c: &mut Criterion) {
    let channels = 84;
    let anchors = 8400;
    let data = make_head(channels, anchors);
    let view = TensorView::channels_first(&data, channels, anchors).unwrap();

    let mut decode_cfg = DecodeConfig::default();
    decode_cfg.activation.class = Activation::Sigmoid;

    c.bench_function("decode_84x8400_sigmoid", |b| {
        b.iter(|| black_box(decode(view, &decode_cfg).unwrap()));
    });

    let softmax_cfg = DecodeConfig {
        activation: detpost::ActivationConfig {
            objectness: Activation::Identity,
            class: Activation::Softmax,
        },
        score_threshold: 0.05,
        ..DecodeConfig::default()
    };
    c.bench_function("decode_84x8400_softmax", |b| {
        b.iter(|| black_box(decode(view, &softmax_cfg).unwrap()));
    });

    let candidates = decode(view, &decode_cfg).unwrap();
    for mode in [SuppressionMode::ClassAgnostic, SuppressionMode::PerClass] {
        let cfg = SuppressConfig {
            mode,
            ..SuppressConfig::default()
        };
        c.bench_function(&format!("suppress_{}", mode.as_str()), |b| {
            b.iter(|| black_box(suppress(&candidates, &cfg).unwrap()));
        });
    }

    let labels: Vec<String> = (0..80).map(|i| format!("class{i}")).collect();
    let mut cfg = PostprocessConfig::with_labels(labels);
    cfg.decode = decode_cfg;
    let post = Postprocessor::new(cfg.clone()).unwrap();
    c.bench_function("postprocess_84x8400", |b| {
        b.iter(|| black_box(post.run(view).unwrap().detections.len()));
    });

    if cfg!(feature = "rayon") {
        cfg.decode.parallel = true;
        let post_par = Postprocessor::new(cfg).unwrap();
        c.bench_function("postprocess_84x8400_parallel", |b| {
            b.iter(|| black_box(post_par.run(view).unwrap().detections.len()));
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

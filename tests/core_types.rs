use detpost::{
    decode, AxisOrder, ConfigError, DecodeConfig, DetPostError, DisplayScale, ScoreLayout,
    ShapeError, SuppressConfig, TensorShape, TensorView,
};

#[test]
fn tensor_view_rejects_batches_other_than_one() {
    let data = [0.0f32; 10];
    let shape = TensorShape {
        batch: 2,
        channels: 5,
        anchors: 1,
    };
    let err = TensorView::new(&data, shape, AxisOrder::ChannelsFirst)
        .err()
        .unwrap();
    assert_eq!(err, DetPostError::Shape(ShapeError::UnsupportedBatch { batch: 2 }));
}

#[test]
fn tensor_view_rejects_zero_anchors() {
    let data = [0.0f32; 4];
    let err = TensorView::channels_first(&data, 5, 0).err().unwrap();
    assert_eq!(err, DetPostError::Shape(ShapeError::NoAnchors));
}

#[test]
fn tensor_view_rejects_small_buffer() {
    let data = [0.0f32; 9];
    let err = TensorView::channels_first(&data, 5, 2).err().unwrap();
    assert_eq!(
        err,
        DetPostError::Shape(ShapeError::BufferTooSmall { needed: 10, got: 9 })
    );
}

#[test]
fn tensor_shape_from_dims_follows_axis_order() {
    let cf = TensorShape::from_dims([1, 84, 8400], AxisOrder::ChannelsFirst);
    assert_eq!((cf.channels, cf.anchors), (84, 8400));
    let af = TensorShape::from_dims([1, 8400, 84], AxisOrder::AnchorsFirst);
    assert_eq!((af.channels, af.anchors), (84, 8400));
}

#[test]
fn decode_rejects_tensors_without_room_for_a_class() {
    let data = [0.0f32; 8];
    let view = TensorView::channels_first(&data, 4, 2).unwrap();
    let err = decode(view, &DecodeConfig::default()).err().unwrap();
    assert_eq!(
        err,
        DetPostError::Shape(ShapeError::TooFewChannels {
            channels: 4,
            min: 5,
        })
    );

    let data = [0.0f32; 10];
    let view = TensorView::channels_first(&data, 5, 2).unwrap();
    let cfg = DecodeConfig {
        layout: ScoreLayout::Objectness,
        ..DecodeConfig::default()
    };
    let err = decode(view, &cfg).err().unwrap();
    assert_eq!(
        err,
        DetPostError::Shape(ShapeError::TooFewChannels {
            channels: 5,
            min: 6,
        })
    );
}

#[test]
fn suppress_config_rejects_out_of_range_iou() {
    for value in [-0.1f32, 1.5] {
        let cfg = SuppressConfig {
            iou_threshold: value,
            ..SuppressConfig::default()
        };
        assert_eq!(
            cfg.validate().err().unwrap(),
            DetPostError::Config(ConfigError::ThresholdOutOfRange {
                name: "iou_threshold",
                value,
            })
        );
    }
    let cfg = SuppressConfig {
        iou_threshold: f32::NAN,
        ..SuppressConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn display_scale_rejects_non_positive_sizes() {
    let err = DisplayScale::new(640.0, 640.0, -1.0, 480.0).err().unwrap();
    assert_eq!(
        err,
        DetPostError::Config(ConfigError::NonPositiveSize {
            name: "display_w",
            value: -1.0,
        })
    );
}

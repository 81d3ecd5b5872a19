//! Strided views over raw detector output tensors.
//!
//! `TensorView` borrows a flat contiguous `f32` buffer together with an
//! explicit `(batch, channels, anchors)` shape. Element `(channel, anchor)`
//! is located through two strides derived from the axis order, so a
//! transposed head is read in place without reshaping or copying.

use crate::util::{DetPostResult, ShapeError};

/// Memory order of the two trailing tensor axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisOrder {
    /// Shape `[1, C, N]`: one row per channel, one column per anchor.
    #[default]
    ChannelsFirst,
    /// Shape `[1, N, C]`: one row per anchor.
    AnchorsFirst,
}

/// Declared tensor shape in logical `(batch, channels, anchors)` terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorShape {
    /// Batch size; only 1 is supported.
    pub batch: usize,
    /// Box parameters plus score channels.
    pub channels: usize,
    /// Anchor count for the model input resolution.
    pub anchors: usize,
}

impl TensorShape {
    /// Builds a shape from the three dimensions as they appear in memory.
    ///
    /// For `AnchorsFirst` the last two dimensions are `[N, C]`.
    pub fn from_dims(dims: [usize; 3], order: AxisOrder) -> Self {
        let [batch, a, b] = dims;
        match order {
            AxisOrder::ChannelsFirst => Self {
                batch,
                channels: a,
                anchors: b,
            },
            AxisOrder::AnchorsFirst => Self {
                batch,
                channels: b,
                anchors: a,
            },
        }
    }
}

/// Borrowed read-only view into a detector output tensor.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    channels: usize,
    anchors: usize,
    order: AxisOrder,
    channel_stride: usize,
    anchor_stride: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a `[1, C, N]` view.
    pub fn channels_first(data: &'a [f32], channels: usize, anchors: usize) -> DetPostResult<Self> {
        Self::new(
            data,
            TensorShape {
                batch: 1,
                channels,
                anchors,
            },
            AxisOrder::ChannelsFirst,
        )
    }

    /// Creates a view with an explicit shape and axis order.
    pub fn new(data: &'a [f32], shape: TensorShape, order: AxisOrder) -> DetPostResult<Self> {
        if shape.batch != 1 {
            return Err(ShapeError::UnsupportedBatch { batch: shape.batch }.into());
        }
        if shape.anchors == 0 {
            return Err(ShapeError::NoAnchors.into());
        }
        let needed = shape
            .channels
            .checked_mul(shape.anchors)
            .ok_or(ShapeError::Overflow {
                channels: shape.channels,
                anchors: shape.anchors,
            })?;
        if data.len() < needed {
            return Err(ShapeError::BufferTooSmall {
                needed,
                got: data.len(),
            }
            .into());
        }

        let (channel_stride, anchor_stride) = match order {
            AxisOrder::ChannelsFirst => (shape.anchors, 1),
            AxisOrder::AnchorsFirst => (1, shape.channels),
        };
        Ok(Self {
            data,
            channels: shape.channels,
            anchors: shape.anchors,
            order,
            channel_stride,
            anchor_stride,
        })
    }

    /// Returns the channel count `C`.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the anchor count `N`.
    pub fn anchors(&self) -> usize {
        self.anchors
    }

    /// Returns the axis order of the backing buffer.
    pub fn order(&self) -> AxisOrder {
        self.order
    }

    /// Returns the element at `(channel, anchor)` if it is within bounds.
    pub fn get(&self, channel: usize, anchor: usize) -> Option<f32> {
        if channel >= self.channels || anchor >= self.anchors {
            return None;
        }
        self.data.get(self.offset(channel, anchor)).copied()
    }

    /// Returns the element at `(channel, anchor)`.
    ///
    /// Callers must stay within `channels() x anchors()`; the constructor
    /// guarantees every such offset is inside the buffer.
    #[inline]
    pub(crate) fn at(&self, channel: usize, anchor: usize) -> f32 {
        debug_assert!(channel < self.channels && anchor < self.anchors);
        self.data[self.offset(channel, anchor)]
    }

    /// Returns a contiguous row for `channel` when the layout is channels-first.
    pub fn channel_row(&self, channel: usize) -> Option<&'a [f32]> {
        if self.order != AxisOrder::ChannelsFirst || channel >= self.channels {
            return None;
        }
        let start = channel * self.channel_stride;
        self.data.get(start..start + self.anchors)
    }

    #[inline]
    fn offset(&self, channel: usize, anchor: usize) -> usize {
        channel * self.channel_stride + anchor * self.anchor_stride
    }
}

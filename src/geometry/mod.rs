//! Axis-aligned box geometry in model input space.
//!
//! The decoder converts center-form boxes to corner form exactly once; all
//! suppression and output code works with `CornerBox`.

use crate::util::{ConfigError, DetPostResult};

/// Box in center form `(cx, cy, w, h)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBox {
    /// Center x coordinate.
    pub cx: f32,
    /// Center y coordinate.
    pub cy: f32,
    /// Width; negative values are treated as zero.
    pub w: f32,
    /// Height; negative values are treated as zero.
    pub h: f32,
}

impl CenterBox {
    /// Converts to corner form; negative extents collapse to zero.
    #[inline]
    pub fn to_corners(self) -> CornerBox {
        let half_w = self.w.max(0.0) * 0.5;
        let half_h = self.h.max(0.0) * 0.5;
        CornerBox {
            x1: self.cx - half_w,
            y1: self.cy - half_h,
            x2: self.cx + half_w,
            y2: self.cy + half_h,
        }
    }
}

/// Box in corner form with `x1 <= x2` and `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl CornerBox {
    /// Builds a box from two opposite corners in any order.
    #[inline]
    pub fn from_points(xa: f32, ya: f32, xb: f32, yb: f32) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }

    /// True when all four coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Returns the center-form equivalent.
    pub fn to_center(&self) -> CenterBox {
        CenterBox {
            cx: (self.x1 + self.x2) * 0.5,
            cy: (self.y1 + self.y2) * 0.5,
            w: self.width(),
            h: self.height(),
        }
    }

    /// Area of the overlap with `other`, zero when disjoint.
    #[inline]
    pub fn intersection_area(&self, other: &CornerBox) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        w * h
    }

    /// Intersection-over-union with `other`.
    ///
    /// Zero-area boxes and degenerate unions yield 0 instead of dividing.
    #[inline]
    pub fn iou(&self, other: &CornerBox) -> f32 {
        let inter = self.intersection_area(other);
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Scales x coordinates by `sx` and y coordinates by `sy`.
    pub fn scale(&self, sx: f32, sy: f32) -> CornerBox {
        CornerBox::from_points(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }
}

/// Mapping from model input space to a display surface.
///
/// The pipeline never applies this; it documents the contract the display
/// layer follows: x scales by `display_w / model_w`, y by
/// `display_h / model_h`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayScale {
    sx: f32,
    sy: f32,
}

impl DisplayScale {
    /// Creates a mapping from a `model_w x model_h` input to a display size.
    pub fn new(model_w: f32, model_h: f32, display_w: f32, display_h: f32) -> DetPostResult<Self> {
        for (name, value) in [
            ("model_w", model_w),
            ("model_h", model_h),
            ("display_w", display_w),
            ("display_h", display_h),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositiveSize { name, value }.into());
            }
        }
        Ok(Self {
            sx: display_w / model_w,
            sy: display_h / model_h,
        })
    }

    /// Returns the `(sx, sy)` scale factors.
    pub fn factors(&self) -> (f32, f32) {
        (self.sx, self.sy)
    }

    /// Maps a model-space box into display space.
    pub fn map_box(&self, bbox: &CornerBox) -> CornerBox {
        bbox.scale(self.sx, self.sy)
    }
}

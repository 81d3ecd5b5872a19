//! Numeric helpers for activations and threshold checks.

use crate::util::ConfigError;

/// Logistic sigmoid, evaluated without overflow for large magnitudes.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Rejects NaN thresholds; any other value is accepted.
pub(crate) fn check_not_nan(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
    }
    Ok(())
}

/// Requires `value` to lie in the closed interval [0, 1].
pub(crate) fn check_unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_not_nan, check_unit_interval, sigmoid};

    #[test]
    fn sigmoid_is_centered_and_saturates() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        assert!(sigmoid(100.0) > 0.999_999);
        assert!(sigmoid(-100.0) < 1e-6);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn sigmoid_is_symmetric() {
        for x in [0.25f32, 1.0, 3.5, 8.0] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn unit_interval_accepts_bounds_and_rejects_nan() {
        assert!(check_unit_interval("iou", 0.0).is_ok());
        assert!(check_unit_interval("iou", 1.0).is_ok());
        assert!(check_unit_interval("iou", 1.01).is_err());
        assert!(check_unit_interval("iou", -0.01).is_err());
        assert!(check_unit_interval("iou", f32::NAN).is_err());
        assert!(check_not_nan("score", f32::NAN).is_err());
        assert!(check_not_nan("score", -3.0).is_ok());
    }
}

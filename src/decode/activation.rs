//! Score activation functions applied before confidence fusion.

use crate::util::math::sigmoid;
use crate::util::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Activation applied to raw objectness or class channels.
///
/// Exported detectors disagree on whether scores leave the graph as logits
/// or probabilities, so this is configuration rather than a constant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activation {
    /// Values are already probabilities; they are clamped to `[0, 1]`.
    #[default]
    Identity,
    /// Element-wise logistic function.
    Sigmoid,
    /// Normalized exponential across the class channels of one anchor.
    Softmax,
}

impl Activation {
    /// Stable lowercase name, used in logs and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Sigmoid => "sigmoid",
            Activation::Softmax => "softmax",
        }
    }

    /// Applies an element-wise activation.
    ///
    /// Returns `None` for `Softmax`, which needs the whole class vector.
    #[inline]
    pub fn apply_scalar(&self, x: f32) -> Option<f32> {
        match self {
            Activation::Identity => Some(x.clamp(0.0, 1.0)),
            Activation::Sigmoid => Some(sigmoid(x)),
            Activation::Softmax => None,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "none" => Ok(Activation::Identity),
            "sigmoid" => Ok(Activation::Sigmoid),
            "softmax" => Ok(Activation::Softmax),
            _ => Err(ConfigError::UnsupportedActivation {
                role: "activation",
                kind: s.to_string(),
            }),
        }
    }
}

/// Activations for the objectness channel and the class channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivationConfig {
    pub objectness: Activation,
    pub class: Activation,
}

impl ActivationConfig {
    /// Rejects combinations that have no meaning.
    ///
    /// Objectness is a single scalar per anchor, so softmax over it is
    /// always 1 and is refused.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.objectness == Activation::Softmax {
            return Err(ConfigError::UnsupportedActivation {
                role: "objectness",
                kind: self.objectness.to_string(),
            });
        }
        Ok(())
    }
}

/// Softmax normalizer for one anchor: the max logit and the exp-sum.
///
/// A `+inf` logit saturates the distribution: infinite logits get
/// probability 1 and all others 0, so the argmax picks the first of them.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SoftmaxNorm {
    max: f32,
    inv_sum: f32,
}

impl SoftmaxNorm {
    /// Computes the normalizer from a class-logit accessor.
    #[inline]
    pub fn from_logits(count: usize, logit: impl Fn(usize) -> f32) -> Self {
        let mut max = f32::NEG_INFINITY;
        for c in 0..count {
            max = max.max(logit(c));
        }
        if max == f32::INFINITY {
            return Self { max, inv_sum: 0.0 };
        }
        let mut sum = 0.0f32;
        for c in 0..count {
            sum += (logit(c) - max).exp();
        }
        Self {
            max,
            inv_sum: 1.0 / sum,
        }
    }

    #[inline]
    pub fn prob(&self, logit: f32) -> f32 {
        if self.max == f32::INFINITY {
            return if logit == f32::INFINITY { 1.0 } else { 0.0 };
        }
        (logit - self.max).exp() * self.inv_sum
    }
}

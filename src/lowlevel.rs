//! Low-level building blocks for custom post-processing pipelines.
//!
//! These items expose activation helpers and channel layout constants for
//! callers that decode tensors themselves. Most users should prefer
//! [`decode`](crate::decode()), [`suppress`](crate::suppress()) and
//! [`Postprocessor`](crate::Postprocessor).

pub use crate::decode::activation::{Activation, ActivationConfig};
pub use crate::decode::{BoxEncoding, ScoreLayout, BOX_CHANNELS};
pub use crate::util::math::sigmoid;

//! Geometric line-of-sight evaluation between two objects near a spherical occluding body.
//!
//! The visibility scalar follows the horizon-sum construction: each object sees the body's
//! horizon at a half-angle `alpha = acos(R / |r|)` from its own position vector, and the pair
//! has a clear line of sight while the angle between the two position vectors is smaller than
//! the sum of both half-angles. Positive values mean visible, negative values mean occluded,
//! zero is a grazing (tangent) line of sight.

pub mod body;
pub mod derivative;
pub mod sampler;
pub mod visibility;

pub use body::{DEFAULT_SURFACE_TOLERANCE, OccludingBody};
pub use derivative::derivative;
pub use sampler::{StateVector, VisibilitySample, sample, sample_batch};
pub use visibility::{VisibilityGeometry, evaluate, evaluate_batch};

use thiserror::Error;

/// Errors surfaced by the batched evaluators. Single evaluations never fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("batched inputs differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

//! Instantaneous visibility function.

use std::f64::consts::FRAC_PI_2;

use satvis_core::vector::{Vector3, dot, norm};

use crate::GeometryError;
use crate::body::OccludingBody;

/// Visibility scalar together with the angles it was built from (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityGeometry {
    /// `alpha1 + alpha2 - phi`; positive means a clear line of sight.
    pub visibility: f64,
    /// Angle between the two position vectors.
    pub phi: f64,
    /// Horizon half-angle seen from the first object.
    pub alpha1: f64,
    /// Horizon half-angle seen from the second object.
    pub alpha2: f64,
}

impl VisibilityGeometry {
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visibility > 0.0
    }
}

/// Evaluate the visibility function for one pair of positions.
///
/// Objects closer to the centre than the exclusion radius are placed on the surface
/// (see [`OccludingBody::clamp_distance`]). Identical positions give `phi = 0`, so two
/// objects at the same point above the surface are always mutually visible.
pub fn evaluate(r1: &Vector3, r2: &Vector3, body: &OccludingBody) -> VisibilityGeometry {
    let r1_mag = norm(r1);
    let r2_mag = norm(r2);
    let phi = if r1 == r2 {
        0.0
    } else {
        separation_angle(r1, r2, r1_mag, r2_mag)
    };
    let alpha1 = horizon_half_angle(r1_mag, body, "r1");
    let alpha2 = horizon_half_angle(r2_mag, body, "r2");
    VisibilityGeometry {
        visibility: alpha1 + alpha2 - phi,
        phi,
        alpha1,
        alpha2,
    }
}

/// Evaluate [`evaluate`] elementwise over two equal-length position histories.
pub fn evaluate_batch(
    r1: &[Vector3],
    r2: &[Vector3],
    body: &OccludingBody,
) -> Result<Vec<VisibilityGeometry>, GeometryError> {
    if r1.len() != r2.len() {
        return Err(GeometryError::LengthMismatch {
            left: r1.len(),
            right: r2.len(),
        });
    }
    Ok(r1
        .iter()
        .zip(r2)
        .map(|(a, b)| evaluate(a, b, body))
        .collect())
}

fn separation_angle(r1: &Vector3, r2: &Vector3, r1_mag: f64, r2_mag: f64) -> f64 {
    let denom = r1_mag * r2_mag;
    if denom == 0.0 {
        // A position at the body centre has no direction.
        return 0.0;
    }
    (dot(r1, r2) / denom).clamp(-1.0, 1.0).acos()
}

fn horizon_half_angle(distance: f64, body: &OccludingBody, object: &'static str) -> f64 {
    let exclusion = body.exclusion_radius();
    if exclusion <= 0.0 {
        return FRAC_PI_2;
    }
    let distance = body.clamp_distance(distance, object);
    (exclusion / distance).clamp(-1.0, 1.0).acos()
}

//! Analytic time derivative of the visibility function.

use satvis_core::vector::{Vector3, dot, norm};
use tracing::debug;

use crate::body::OccludingBody;
use crate::visibility::VisibilityGeometry;

/// Below this, `sin(phi)` or `sin(alpha)` is treated as singular.
const SINGULAR_SINE: f64 = 1.0e-12;

/// Time derivative of the visibility scalar, `d(alpha1 + alpha2 - phi)/dt`.
///
/// `angles` must come from [`crate::evaluate`] for the same positions and body. The
/// derivative is singular at two places and both are handled without failing:
///
/// * collinear positions (`phi` of 0 or pi): the separation rate is reported as zero;
/// * an object on the exclusion sphere with a radial velocity: the horizon rate tends to
///   infinity, so `sin(alpha)` is floored and a large but finite value is returned.
///   Accuracy is reduced near grazing geometry.
pub fn derivative(
    r1: &Vector3,
    r1dot: &Vector3,
    r2: &Vector3,
    r2dot: &Vector3,
    angles: &VisibilityGeometry,
    body: &OccludingBody,
) -> f64 {
    rate(r1, r1dot, r2, r2dot, angles, body).0
}

/// [`derivative`] plus a flag set when a horizon rate was computed from a floored `sin(alpha)`.
/// A flagged value is only an order-of-magnitude bound and must not drive interpolation.
pub(crate) fn rate(
    r1: &Vector3,
    r1dot: &Vector3,
    r2: &Vector3,
    r2dot: &Vector3,
    angles: &VisibilityGeometry,
    body: &OccludingBody,
) -> (f64, bool) {
    let phi_rate = separation_rate(r1, r1dot, r2, r2dot, angles.phi);
    let (alpha1_rate, grazing1) = horizon_rate(r1, r1dot, angles.alpha1, body);
    let (alpha2_rate, grazing2) = horizon_rate(r2, r2dot, angles.alpha2, body);
    (alpha1_rate + alpha2_rate - phi_rate, grazing1 || grazing2)
}

fn separation_rate(r1: &Vector3, r1dot: &Vector3, r2: &Vector3, r2dot: &Vector3, phi: f64) -> f64 {
    let r1_mag = norm(r1);
    let r2_mag = norm(r2);
    if r1_mag == 0.0 || r2_mag == 0.0 {
        return 0.0;
    }
    let sin_phi = phi.sin();
    if sin_phi.abs() < SINGULAR_SINE {
        debug!(phi, "separation rate undefined for collinear positions");
        return 0.0;
    }

    let r1_mag_rate = dot(r1, r1dot) / r1_mag;
    let r2_mag_rate = dot(r2, r2dot) / r2_mag;
    let cos_phi = dot(r1, r2) / (r1_mag * r2_mag);
    let cos_rate = (dot(r1dot, r2) + dot(r1, r2dot)) / (r1_mag * r2_mag)
        - cos_phi * (r1_mag_rate / r1_mag + r2_mag_rate / r2_mag);
    -cos_rate / sin_phi
}

fn horizon_rate(r: &Vector3, rdot: &Vector3, alpha: f64, body: &OccludingBody) -> (f64, bool) {
    let exclusion = body.exclusion_radius();
    let r_mag = norm(r);
    if exclusion <= 0.0 || r_mag == 0.0 {
        return (0.0, false);
    }
    let range_rate = dot(r, rdot) / r_mag;
    if range_rate == 0.0 {
        return (0.0, false);
    }
    // Same clamped distance the evaluator used for alpha.
    let distance = r_mag.max(exclusion);
    let mut sin_alpha = alpha.sin();
    let grazing = sin_alpha < SINGULAR_SINE;
    if grazing {
        debug!(
            distance,
            range_rate, "horizon rate near grazing geometry; result has reduced accuracy"
        );
        sin_alpha = SINGULAR_SINE;
    }
    (exclusion * range_rate / (distance * distance * sin_alpha), grazing)
}

//! Combined visibility and derivative sampling for time-series construction.

use satvis_core::vector::Vector3;

use crate::GeometryError;
use crate::body::OccludingBody;
use crate::derivative::rate;
use crate::visibility::evaluate;

/// Position and velocity of one object at one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3,
    pub velocity: Vector3,
}

impl StateVector {
    pub fn new(position: Vector3, velocity: Vector3) -> Self {
        Self { position, velocity }
    }
}

/// Visibility scalar and its time derivative at a single epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilitySample {
    pub visibility: f64,
    pub derivative: f64,
    /// An object sits on the exclusion sphere while moving radially. `derivative` is then a
    /// floored stand-in for an unbounded rate and should not be used for interpolation.
    pub grazing: bool,
}

/// Evaluate the visibility function and its derivative for one pair of states.
pub fn sample(
    r1: &Vector3,
    r2: &Vector3,
    r1dot: &Vector3,
    r2dot: &Vector3,
    body: &OccludingBody,
) -> VisibilitySample {
    let angles = evaluate(r1, r2, body);
    let (derivative, grazing) = rate(r1, r1dot, r2, r2dot, &angles, body);
    VisibilitySample {
        visibility: angles.visibility,
        derivative,
        grazing,
    }
}

/// Apply [`sample`] elementwise over two equal-length state histories.
pub fn sample_batch(
    states1: &[StateVector],
    states2: &[StateVector],
    body: &OccludingBody,
) -> Result<Vec<VisibilitySample>, GeometryError> {
    if states1.len() != states2.len() {
        return Err(GeometryError::LengthMismatch {
            left: states1.len(),
            right: states2.len(),
        });
    }
    Ok(states1
        .iter()
        .zip(states2)
        .map(|(a, b)| sample(&a.position, &b.position, &a.velocity, &b.velocity, body))
        .collect())
}

//! Spherical occluding body and its below-surface clamping policy.

use tracing::{trace, warn};

/// Undershoot (in distance units) below which clamping to the surface is silent.
pub const DEFAULT_SURFACE_TOLERANCE: f64 = 1.0e-6;

/// Spherical occluder with an optional height offset (mask altitude, atmosphere margin, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccludingBody {
    /// Body radius; non-negative.
    pub radius: f64,
    /// Extra clearance added to the radius; non-negative.
    pub height_offset: f64,
    /// Objects within this distance below the exclusion radius are clamped without a warning.
    pub surface_tolerance: f64,
}

impl OccludingBody {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            height_offset: 0.0,
            surface_tolerance: DEFAULT_SURFACE_TOLERANCE,
        }
    }

    pub fn with_height_offset(mut self, height_offset: f64) -> Self {
        self.height_offset = height_offset;
        self
    }

    pub fn with_surface_tolerance(mut self, surface_tolerance: f64) -> Self {
        self.surface_tolerance = surface_tolerance;
        self
    }

    /// Radius of the sphere that blocks the line of sight (`radius + height_offset`).
    #[inline]
    pub fn exclusion_radius(&self) -> f64 {
        self.radius + self.height_offset
    }

    /// Clamp an object's distance from the body centre up to the exclusion radius.
    ///
    /// Undershoot within `surface_tolerance` is treated as numerical noise and clamped quietly;
    /// anything deeper is clamped as well but reported with a warning. Never fails.
    pub fn clamp_distance(&self, distance: f64, object: &'static str) -> f64 {
        let exclusion = self.exclusion_radius();
        if distance >= exclusion {
            return distance;
        }
        let deficit = exclusion - distance;
        if deficit > self.surface_tolerance {
            warn!(
                object,
                distance,
                exclusion_radius = exclusion,
                deficit,
                "object lies below the occluding surface; treating it as on the surface"
            );
        } else {
            trace!(object, deficit, "negligible undershoot clamped to the surface");
        }
        exclusion
    }
}

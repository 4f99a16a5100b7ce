//! Access windows for object pairs: sample `(v, dv/dt)` on a shared epoch grid, then extract.

use satvis_config::BodyConfig;
use satvis_geometry::{GeometryError, OccludingBody, StateVector, sample_batch};
use satvis_windows::{
    ExtractionError, ExtractionMode, IntervalCollection, VisibilitySeries, WindowExtraction,
    extract_series,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("pair '{label}' has {states} states for {epochs} epochs")]
    EpochMismatch {
        label: String,
        epochs: usize,
        states: usize,
    },
}

/// Two state histories sampled on the same epochs, tagged with a pair identifier.
#[derive(Debug, Clone, Copy)]
pub struct ObjectPair<'a> {
    pub label: &'a str,
    pub first: &'a [StateVector],
    pub second: &'a [StateVector],
}

/// Build an occluding body from a catalog entry.
pub fn body_from_config(config: &BodyConfig) -> OccludingBody {
    let body = OccludingBody::new(config.radius_km).with_height_offset(config.height_offset_km);
    match config.surface_tolerance_km {
        Some(tolerance) => body.with_surface_tolerance(tolerance),
        None => body,
    }
}

/// Crossings and windows for one pair of objects.
pub fn compute_access(
    times: &[f64],
    first: &[StateVector],
    second: &[StateVector],
    body: &OccludingBody,
    label: &str,
    mode: ExtractionMode,
) -> Result<WindowExtraction, AccessError> {
    if first.len() != times.len() {
        return Err(AccessError::EpochMismatch {
            label: label.to_string(),
            epochs: times.len(),
            states: first.len(),
        });
    }
    let samples = sample_batch(first, second, body)?;
    let values: Vec<f64> = samples.iter().map(|s| s.visibility).collect();
    let derivatives: Vec<f64> = samples.iter().map(|s| s.derivative).collect();
    // Rates floored at grazing are re-estimated from the samples instead of bending the fit.
    let grazing: Vec<bool> = samples.iter().map(|s| s.grazing).collect();

    let series = VisibilitySeries::with_derivatives(times, &values, &derivatives)?
        .with_unreliable_derivatives(&grazing)?;
    let extraction = extract_series(&series, label, mode);
    debug!(
        label,
        samples = times.len(),
        crossings = extraction.crossings.len(),
        windows = extraction.windows.len(),
        "pair access computed"
    );
    Ok(extraction)
}

/// Union of the windows of every pair. Pairs are processed in order; the first failure aborts.
pub fn compute_network_access(
    times: &[f64],
    pairs: &[ObjectPair<'_>],
    body: &OccludingBody,
    mode: ExtractionMode,
) -> Result<IntervalCollection, AccessError> {
    let mut combined = IntervalCollection::new();
    for pair in pairs {
        let extraction = compute_access(times, pair.first, pair.second, body, pair.label, mode)?;
        combined = combined.union(&extraction.windows);
    }
    info!(
        pairs = pairs.len(),
        windows = combined.len(),
        "network access computed"
    );
    Ok(combined)
}

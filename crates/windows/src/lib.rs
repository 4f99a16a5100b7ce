//! Visibility window extraction from sampled visibility histories.
//!
//! [`extract_windows`] turns a `(t, v)` history (optionally with `dv/dt`) into rise/set
//! crossings and a labeled [`IntervalCollection`] of windows. Collections built for different
//! object pairs combine with [`IntervalCollection::union`].

pub mod crossing;
mod estimate;
mod gap;
pub mod interval;
pub mod series;

pub use crossing::{
    Crossing, CrossingDirection, ExtractionMode, WindowExtraction, extract_series,
    extract_windows, extract_windows_with_derivatives,
};
pub use interval::{IntervalCollection, IntervalError, Window};
pub use series::VisibilitySeries;

use thiserror::Error;

/// Malformed time series, rejected before any computation.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    #[error("time and visibility histories differ in length: {times} vs {values}")]
    LengthMismatch { times: usize, values: usize },
    #[error("time and derivative histories differ in length: {times} vs {derivatives}")]
    DerivativeLengthMismatch { times: usize, derivatives: usize },
    #[error("time history and unreliable-derivative mask differ in length: {times} vs {mask}")]
    MaskLengthMismatch { times: usize, mask: usize },
    #[error("times must be strictly increasing (t[{index}] = {current} after {previous})")]
    NonIncreasingTime {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("sample {index} is not finite")]
    NonFiniteSample { index: usize },
}

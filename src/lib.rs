//! Line-of-sight visibility between objects around a spherical occluding body.
//!
//! The geometry crate evaluates the visibility scalar and its rate, the windows crate turns a
//! sampled history into rise/set crossings and labeled windows. [`access`] wires the two
//! together for state histories produced by an external propagator.

pub mod access;

pub use satvis_config as config;
pub use satvis_core::{constants, vector};
pub use satvis_export as export;
pub use satvis_geometry as geometry;
pub use satvis_windows as windows;

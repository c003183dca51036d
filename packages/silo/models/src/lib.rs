#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Silo detection types.

use geo::Geometry;

/// One candidate storage structure from the detection layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SiloDetection {
    /// Position in the input layer. Only meaningful within one run.
    pub id: usize,
    /// Measured diameter in meters.
    pub diameter: f64,
    /// Point or footprint, in the input coordinate system.
    pub geometry: Geometry<f64>,
}

impl SiloDetection {
    /// Whether the diameter lies within `[min, max]`, inclusive.
    #[must_use]
    pub fn diameter_within(&self, min: f64, max: f64) -> bool {
        (min..=max).contains(&self.diameter)
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Silo detection loading and cluster filtering.
//!
//! Raw detections are noisy. A genuine grain storage site usually has
//! several bins side by side, so after dropping implausible sizes only
//! detections with enough neighbors nearby are kept ([`cluster`]).

pub mod cluster;
pub mod load;

pub use cluster::filter_clustered_silos;
pub use load::{load_detections, parse_detections};

/// Errors that can occur while loading or filtering silo detections.
#[derive(Debug, thiserror::Error)]
pub enum SiloError {
    /// The detection file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cluster settings are unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] farm_leads_config::ConfigError),

    /// Projection, geometry, or `GeoJSON` handling failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] farm_leads_spatial::SpatialError),

    /// A detection feature could not be used.
    #[error("Silo feature {index}: {message}")]
    Feature {
        /// Position of the feature in the input collection.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Projecting one detection into the distance coordinate system failed.
    #[error("Silo {id} could not be projected: {source}")]
    Projection {
        /// Synthetic id of the detection.
        id: usize,
        /// Underlying projection error.
        source: farm_leads_spatial::SpatialError,
    },
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel loading and per-owner farmland aggregation.
//!
//! Reads the county parcel layer ([`load`]), keeps parcels with farmland,
//! and merges them per owner into footprints with summed acreage and one
//! contact record ([`aggregate`]).

pub mod aggregate;
pub mod load;

pub use aggregate::aggregate_owners;
pub use load::{load_parcels, parse_parcels};

/// Errors that can occur while loading parcels.
#[derive(Debug, thiserror::Error)]
pub enum ParcelError {
    /// The parcel file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Spatial parsing or conversion failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] farm_leads_spatial::SpatialError),

    /// A parcel feature could not be used.
    #[error("Parcel feature {index}: {message}")]
    Feature {
        /// Position of the feature in the input collection.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },
}

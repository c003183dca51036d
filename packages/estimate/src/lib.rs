#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Capacity estimation and owner attribution.
//!
//! Turns clustered silo detections into bushel estimates using the
//! capacity model ([`estimate`]), assigns them to the owners whose
//! farmland they stand on and sums per owner ([`attribute`]), and writes
//! the resulting leads ([`output`]).

pub mod attribute;
pub mod estimate;
pub mod output;

pub use attribute::attribute;
pub use estimate::estimate;

/// Errors that can occur while estimating, attributing, or writing leads.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    /// The capacity model has no reference diameters.
    #[error("No reference diameters are available to estimate silo {silo_id}")]
    NoReferenceDiameter {
        /// Synthetic id of the silo being estimated.
        silo_id: usize,
    },

    /// A bracket names a tier that has no curve.
    #[error("Silo {silo_id}: tier '{tier}' at reference diameter {diameter} m has no capacity curve")]
    UnknownTier {
        /// Synthetic id of the silo being estimated.
        silo_id: usize,
        /// Tier label.
        tier: String,
        /// Reference diameter of the bracket.
        diameter: f64,
    },

    /// An estimate came out as `NaN` or infinite.
    #[error("Silo {silo_id} with diameter {diameter} m produced a non-finite estimate")]
    NonFiniteEstimate {
        /// Synthetic id of the silo being estimated.
        silo_id: usize,
        /// Its diameter.
        diameter: f64,
    },

    /// An output file could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

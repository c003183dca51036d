#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Silo capacity model built from a manufacturer reference table.
//!
//! For each tier the table's (diameter, bushels) points are fitted with a
//! power law by regressing `ln(bushels)` on diameter ([`curve`]). For each
//! reference diameter the smallest and largest available tier form a
//! bracket ([`bracket`]) that bounds the low and high estimate of a silo
//! of about that size.
//!
//! Reference: Brock non-stiffened storage capacities fact sheet
//! (BR 2286, 2017).

pub mod bracket;
pub mod curve;
pub mod load;

pub use bracket::{ensure_coverage, tier_bracket_by_diameter};
pub use curve::fit_tier_curves;
pub use load::{load_reference_table, parse_reference_table};

/// Errors that can occur while building the capacity model.
#[derive(Debug, thiserror::Error)]
pub enum CapacityError {
    /// The reference table could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Reference table has no '{0}' column")]
    MissingColumn(String),

    /// A row holds a value that cannot be used.
    #[error("Reference table row {row}: {message}")]
    InvalidRow {
        /// 1-based data row number.
        row: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// A tier has too few points to fit a curve.
    #[error("Tier '{tier}' has {points} usable reference point(s); at least 2 are needed to fit a curve")]
    InsufficientData {
        /// Tier label.
        tier: String,
        /// Usable (diameter, capacity) points.
        points: usize,
    },

    /// A tier named in a bracket has no fitted curve.
    #[error("Tier '{tier}' bounds diameter {diameter} m but has no capacity curve")]
    MissingCurve {
        /// Tier label.
        tier: String,
        /// Reference diameter whose bracket names it.
        diameter: f64,
    },
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land ownership types.
//!
//! A [`Parcel`] is one ownership record as read from the county parcel
//! layer. Parcels with farmland are merged per owner into an
//! [`OwnerAggregate`], which is the primary axis of the lead output.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Mailing contact details for an owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Street address line.
    pub mail_address: Option<String>,
    /// City, state and ZIP line.
    pub mail_city_state_zip: Option<String>,
}

/// A single land-ownership record.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Owner identifier as read, before whitespace normalization.
    pub owner_id: String,
    /// Farmland acreage. Never negative; missing values are zero.
    pub farm_acres: f64,
    /// Parcel footprint.
    pub geometry: MultiPolygon<f64>,
    /// Mailing details recorded on this parcel.
    pub contact: ContactInfo,
}

impl Parcel {
    /// Owner identifier used for grouping: surrounding whitespace removed.
    #[must_use]
    pub fn normalized_owner(&self) -> &str {
        self.owner_id.trim()
    }

    /// Whether this parcel carries farmland and so counts toward its
    /// owner's aggregate.
    #[must_use]
    pub fn is_farmland(&self) -> bool {
        self.farm_acres > 0.0
    }
}

/// All farmland parcels of one owner merged into a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerAggregate {
    /// Normalized owner identifier, unique across aggregates.
    pub owner: String,
    /// Union of the owner's farmland parcel footprints.
    pub geometry: MultiPolygon<f64>,
    /// Summed farmland acreage.
    pub farm_acres: f64,
    /// Contact details from the owner's first farmland parcel.
    pub contact: ContactInfo,
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Capacity estimate and lead record types.

use farm_leads_capacity_models::TierBracket;
use farm_leads_parcel_models::{ContactInfo, OwnerAggregate};
use farm_leads_silo_models::SiloDetection;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Low and high capacity of one silo, with what they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEstimate {
    /// Bushels from the bracket's smallest tier.
    pub low: f64,
    /// Bushels from the bracket's largest tier.
    pub high: f64,
    /// Reference diameter whose bracket was used.
    pub reference_diameter: f64,
    /// Tiers that produced `low` and `high`.
    pub bracket: TierBracket,
}

/// A clustered silo detection with its capacity estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatedSilo {
    /// The detection as it left the cluster filter.
    pub silo: SiloDetection,
    /// Its capacity estimate.
    pub estimate: CapacityEstimate,
}

/// One sales lead: an owner with farmland and estimated storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRecord {
    /// Normalized owner identifier.
    pub owner: String,
    /// Mailing details.
    pub contact: ContactInfo,
    /// Summed farmland acreage.
    pub farm_acres: f64,
    /// Sum of low estimates of the owner's silos (0 when none).
    pub min_capacity_est: f64,
    /// Sum of high estimates of the owner's silos (0 when none).
    pub max_capacity_est: f64,
    /// Number of silos attributed to the owner.
    pub silo_count: usize,
    /// Owner's dissolved farmland footprint.
    pub geometry: MultiPolygon<f64>,
}

impl LeadRecord {
    /// A lead with no storage attributed yet.
    #[must_use]
    pub fn from_owner(owner: OwnerAggregate) -> Self {
        Self {
            owner: owner.owner,
            contact: owner.contact,
            farm_acres: owner.farm_acres,
            min_capacity_est: 0.0,
            max_capacity_est: 0.0,
            silo_count: 0,
            geometry: owner.geometry,
        }
    }
}

/// Row of the flat lead extract. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadCsvRow {
    /// Owner identifier.
    pub owner: String,
    /// Mailing street address.
    pub mail_address: Option<String>,
    /// Mailing city, state and ZIP.
    pub mail_city_state_zip: Option<String>,
    /// Summed farmland acreage.
    pub farm_acres: f64,
    /// Summed low capacity estimate.
    pub min_capacity_est: f64,
    /// Summed high capacity estimate.
    pub max_capacity_est: f64,
}

impl From<&LeadRecord> for LeadCsvRow {
    fn from(lead: &LeadRecord) -> Self {
        Self {
            owner: lead.owner.clone(),
            mail_address: lead.contact.mail_address.clone(),
            mail_city_state_zip: lead.contact.mail_city_state_zip.clone(),
            farm_acres: lead.farm_acres,
            min_capacity_est: lead.min_capacity_est,
            max_capacity_est: lead.max_capacity_est,
        }
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Run configuration for the farm lead generation pipeline.
//!
//! Every tunable of a run lives in [`LeadGenConfig`], loaded from a TOML
//! file where each section is optional and falls back to the defaults
//! below. Components receive only their own section ([`ParcelFields`],
//! [`ClusterSettings`], [`ReferenceColumns`], [`CapacitySettings`]).
//!
//! ```toml
//! [inputs]
//! parcels = "inputs/parcels.geojson"
//! silos = "inputs/silos.geojson"
//! reference_table = "inputs/wide_corrugation_bin_data.csv"
//!
//! [cluster]
//! cluster_size = 3
//! cluster_distance_m = 20.0
//! distance_crs = "EPSG:32616"
//! ```

use std::path::{Path, PathBuf};

pub use farm_leads_capacity_models::TierOrdering;
pub use farm_leads_spatial::{Crs, Hemisphere};
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A value is out of range or inconsistent with another value.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what is wrong.
        message: String,
    },
}

/// Root configuration of one lead generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadGenConfig {
    /// Input dataset locations.
    #[serde(default)]
    pub inputs: InputPaths,
    /// Output artifact locations.
    #[serde(default)]
    pub outputs: OutputPaths,
    /// Parcel property names.
    #[serde(default)]
    pub parcel_fields: ParcelFields,
    /// Reference table column names.
    #[serde(default)]
    pub reference_columns: ReferenceColumns,
    /// Silo size filter and clustering.
    #[serde(default)]
    pub cluster: ClusterSettings,
    /// Capacity model options.
    #[serde(default)]
    pub capacity: CapacitySettings,
}

impl LeadGenConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed. The
    /// result is not validated; call [`LeadGenConfig::validate`] once any
    /// command-line overrides have been applied.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads configuration from `path` if given, otherwise uses defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(
            || {
                log::info!("No config file given, using built-in defaults");
                Ok(Self::default())
            },
            Self::load_from_file,
        )
    }

    /// Checks every section for out-of-range or inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parcel_fields.validate()?;
        self.reference_columns.validate()?;
        self.cluster.validate()?;
        Ok(())
    }
}

/// Where the input datasets live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Parcel `GeoJSON` `FeatureCollection`.
    pub parcels: PathBuf,
    /// Silo detection `GeoJSON` `FeatureCollection`.
    pub silos: PathBuf,
    /// Manufacturer capacity table (CSV).
    pub reference_table: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            parcels: PathBuf::from("inputs/parcels.geojson"),
            silos: PathBuf::from("inputs/silos.geojson"),
            reference_table: PathBuf::from("inputs/wide_corrugation_bin_data.csv"),
        }
    }
}

/// Where the output artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Lead records with owner footprints.
    pub leads_geojson: PathBuf,
    /// Flat tabular extract of the lead records.
    pub leads_csv: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            leads_geojson: PathBuf::from("outputs/lead_gen.geojson"),
            leads_csv: PathBuf::from("outputs/lead_gen.csv"),
        }
    }
}

/// Property names read from each parcel feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelFields {
    /// Owner name or identifier.
    pub owner_id: String,
    /// Farmland acreage.
    pub farm_acres: String,
    /// Mailing street address.
    pub mail_address: String,
    /// Mailing city, state and ZIP.
    pub mail_city_state_zip: String,
}

impl Default for ParcelFields {
    fn default() -> Self {
        Self {
            owner_id: "OWNER".to_string(),
            farm_acres: "FARM_ACRES".to_string(),
            mail_address: "MAILTO_ADD".to_string(),
            mail_city_state_zip: "MAILTO_CSZ".to_string(),
        }
    }
}

impl ParcelFields {
    fn validate(&self) -> Result<(), ConfigError> {
        require_name("parcel_fields.owner_id", &self.owner_id)?;
        require_name("parcel_fields.farm_acres", &self.farm_acres)?;
        require_name("parcel_fields.mail_address", &self.mail_address)?;
        require_name("parcel_fields.mail_city_state_zip", &self.mail_city_state_zip)
    }
}

/// Column names of the reference capacity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceColumns {
    /// Bin diameter in meters.
    pub diameter: String,
    /// Tier label.
    pub tier: String,
    /// Capacity in bushels.
    pub capacity: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            diameter: "diameter_m".to_string(),
            tier: "tier".to_string(),
            capacity: "bushels".to_string(),
        }
    }
}

impl ReferenceColumns {
    fn validate(&self) -> Result<(), ConfigError> {
        require_name("reference_columns.diameter", &self.diameter)?;
        require_name("reference_columns.tier", &self.tier)?;
        require_name("reference_columns.capacity", &self.capacity)
    }
}

/// Silo size filter and proximity clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Property holding the detection diameter in meters.
    pub diameter_field: String,
    /// Smallest plausible silo diameter (inclusive).
    pub min_diameter: f64,
    /// Largest plausible silo diameter (inclusive).
    pub max_diameter: f64,
    /// Detections needed within reach, counting the detection itself.
    pub cluster_size: usize,
    /// Buffer applied to each detection, in meters.
    pub cluster_distance_m: f64,
    /// Coordinate system of the input datasets.
    pub source_crs: Crs,
    /// Metric coordinate system used for distances.
    pub distance_crs: Crs,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            diameter_field: "DIAMETER".to_string(),
            min_diameter: 4.0,
            max_diameter: 20.0,
            cluster_size: 3,
            cluster_distance_m: 20.0,
            source_crs: Crs::Wgs84,
            distance_crs: Crs::Utm {
                zone: 16,
                hemisphere: Hemisphere::North,
            },
        }
    }
}

impl ClusterSettings {
    /// Checks diameter bounds, cluster size, distance and projection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_name("cluster.diameter_field", &self.diameter_field)?;

        if !self.min_diameter.is_finite() || !self.max_diameter.is_finite() {
            return Err(invalid("cluster diameter bounds must be finite"));
        }
        if self.min_diameter < 0.0 {
            return Err(invalid(format!(
                "cluster.min_diameter must not be negative, got {}",
                self.min_diameter
            )));
        }
        if self.min_diameter > self.max_diameter {
            return Err(invalid(format!(
                "cluster.min_diameter ({}) exceeds cluster.max_diameter ({})",
                self.min_diameter, self.max_diameter
            )));
        }
        if self.cluster_size == 0 {
            return Err(invalid("cluster.cluster_size must be at least 1"));
        }
        if !self.cluster_distance_m.is_finite() || self.cluster_distance_m < 0.0 {
            return Err(invalid(format!(
                "cluster.cluster_distance_m must be a non-negative number of meters, got {}",
                self.cluster_distance_m
            )));
        }
        if !self.distance_crs.is_metric() {
            return Err(invalid(format!(
                "cluster.distance_crs must be a metric projection, got {}",
                self.distance_crs
            )));
        }
        Ok(())
    }
}

/// Capacity model options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacitySettings {
    /// How tier labels are compared when bracketing a diameter.
    pub tier_ordering: TierOrdering,
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

fn require_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{key} must not be empty")));
    }
    Ok(())
}

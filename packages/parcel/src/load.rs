//! Reads parcels from a `GeoJSON` `FeatureCollection`.
//!
//! Property names come from [`ParcelFields`]. Acreage problems are
//! recovered here so that every [`Parcel`] satisfies `farm_acres >= 0`:
//! missing values become zero, and unparseable or negative values are
//! logged and zeroed. Geometry problems are fatal.

use std::path::Path;

use farm_leads_config::ParcelFields;
use farm_leads_parcel_models::{ContactInfo, Parcel};
use farm_leads_spatial::properties::{
    NumericProperty, numeric_property, string_property, text_property,
};
use farm_leads_spatial::{ensure_finite, geometry_from_geojson, into_multi_polygon, parse_features};

use crate::ParcelError;

/// Reads and parses the parcel file at `path`.
///
/// # Errors
///
/// Returns [`ParcelError`] if the file cannot be read or any feature has
/// unusable geometry.
pub fn load_parcels(path: &Path, fields: &ParcelFields) -> Result<Vec<Parcel>, ParcelError> {
    let contents = std::fs::read_to_string(path)?;
    let parcels = parse_parcels(&contents, fields)?;
    log::info!("Loaded {} parcels from {}", parcels.len(), path.display());
    Ok(parcels)
}

/// Parses parcels from `GeoJSON` text.
///
/// Features without an owner value are skipped, since they cannot be
/// grouped. A blank owner is kept and groups under the empty string.
///
/// # Errors
///
/// Returns [`ParcelError`] if the text is not a `GeoJSON` feature
/// collection or a feature's geometry is missing, non-finite, or not a
/// (multi)polygon.
pub fn parse_parcels(geojson_str: &str, fields: &ParcelFields) -> Result<Vec<Parcel>, ParcelError> {
    let features = parse_features(geojson_str)?;
    let mut parcels = Vec::with_capacity(features.len());
    let mut ownerless = 0usize;

    for (index, feature) in features.into_iter().enumerate() {
        let properties = feature.properties.as_ref();

        let Some(owner_id) = text_property(properties, &fields.owner_id) else {
            ownerless += 1;
            continue;
        };

        let farm_acres = match numeric_property(properties, &fields.farm_acres) {
            NumericProperty::Value(acres) if acres >= 0.0 => acres,
            NumericProperty::Value(acres) => {
                log::warn!("Parcel {index} ({owner_id}) has negative acreage {acres}, using 0");
                0.0
            }
            NumericProperty::Missing => 0.0,
            NumericProperty::Invalid => {
                log::warn!(
                    "Parcel {index} ({owner_id}) has unreadable '{}' value, using 0",
                    fields.farm_acres
                );
                0.0
            }
        };

        let contact = ContactInfo {
            mail_address: string_property(properties, &fields.mail_address),
            mail_city_state_zip: string_property(properties, &fields.mail_city_state_zip),
        };

        let geometry = feature.geometry.ok_or_else(|| ParcelError::Feature {
            index,
            message: "missing geometry".to_string(),
        })?;
        let geometry = geometry_from_geojson(geometry)?;
        ensure_finite(&geometry)?;
        let geometry = into_multi_polygon(geometry).map_err(|e| ParcelError::Feature {
            index,
            message: e.to_string(),
        })?;

        parcels.push(Parcel {
            owner_id,
            farm_acres,
            geometry,
            contact,
        });
    }

    if ownerless > 0 {
        log::warn!(
            "Skipped {ownerless} parcels without an '{}' value",
            fields.owner_id
        );
    }

    Ok(parcels)
}

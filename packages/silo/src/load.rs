//! Reads silo detections from a `GeoJSON` `FeatureCollection`.

use std::path::Path;

use farm_leads_silo_models::SiloDetection;
use farm_leads_spatial::properties::{NumericProperty, numeric_property};
use farm_leads_spatial::{ensure_finite, geometry_from_geojson, parse_features};

use crate::SiloError;

/// Reads and parses the detection file at `path`.
///
/// # Errors
///
/// Returns [`SiloError`] if the file cannot be read or a feature is
/// unusable.
pub fn load_detections(path: &Path, diameter_field: &str) -> Result<Vec<SiloDetection>, SiloError> {
    let contents = std::fs::read_to_string(path)?;
    let detections = parse_detections(&contents, diameter_field)?;
    log::info!(
        "Loaded {} silo detections from {}",
        detections.len(),
        path.display()
    );
    Ok(detections)
}

/// Parses detections from `GeoJSON` text.
///
/// Each detection gets the synthetic id `0..n` in input order.
///
/// # Errors
///
/// Returns [`SiloError::Feature`] when a feature has no geometry or no
/// numeric diameter, and [`SiloError::Spatial`] for malformed geometry.
pub fn parse_detections(
    geojson_str: &str,
    diameter_field: &str,
) -> Result<Vec<SiloDetection>, SiloError> {
    parse_features(geojson_str)?
        .into_iter()
        .enumerate()
        .map(|(id, feature)| {
            let diameter = match numeric_property(feature.properties.as_ref(), diameter_field) {
                NumericProperty::Value(d) => d,
                NumericProperty::Missing | NumericProperty::Invalid => {
                    return Err(SiloError::Feature {
                        index: id,
                        message: format!("no numeric '{diameter_field}' property"),
                    });
                }
            };

            let geometry = feature.geometry.ok_or_else(|| SiloError::Feature {
                index: id,
                message: "missing geometry".to_string(),
            })?;
            let geometry = geometry_from_geojson(geometry)?;
            ensure_finite(&geometry)?;

            Ok(SiloDetection {
                id,
                diameter,
                geometry,
            })
        })
        .collect()
}

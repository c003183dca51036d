#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for farm lead generation.
//!
//! Provides the coordinate system handling used before any distance
//! computation ([`crs`]), the buffered self-join that counts nearby silo
//! detections ([`proximity`]), and an in-memory R-tree over owner
//! polygons for attributing silos to the owners whose land they sit on.

pub mod crs;
pub mod properties;
pub mod proximity;

use geo::{BoundingRect, Geometry, Intersects, MultiPolygon};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};

pub use crs::{Crs, Hemisphere, project_geometry};

/// Errors raised by spatial operations.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The coordinate system string could not be understood.
    #[error("Unrecognized coordinate system '{0}' (expected EPSG:4326, EPSG:326NN or EPSG:327NN)")]
    UnknownCrs(String),

    /// There is no projection between the two coordinate systems.
    #[error("Unsupported projection from {from} to {to}")]
    UnsupportedProjection {
        /// Source coordinate system.
        from: Crs,
        /// Target coordinate system.
        to: Crs,
    },

    /// A coordinate does not belong to the declared coordinate system.
    #[error("Coordinate ({x}, {y}) does not fit {crs}: {reason}")]
    CrsMismatch {
        /// Declared coordinate system.
        crs: Crs,
        /// X / longitude.
        x: f64,
        /// Y / latitude.
        y: f64,
        /// What was wrong with it.
        reason: String,
    },

    /// A geometry is empty, non-finite, or of an unexpected type.
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// An owner polygon stored in the R-tree with the slot of its owner.
struct OwnerEntry {
    slot: usize,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for OwnerEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over owner footprints.
///
/// Slots are the positions of the polygons in the sequence passed to
/// [`OwnerIndex::build`], so callers can map matches back to their own
/// owner records without cloning identifiers into the index.
pub struct OwnerIndex {
    owners: RTree<OwnerEntry>,
}

impl OwnerIndex {
    /// Builds the index from owner footprints in slot order.
    #[must_use]
    pub fn build<'a>(polygons: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Self {
        let entries: Vec<OwnerEntry> = polygons
            .into_iter()
            .enumerate()
            .filter_map(|(slot, polygon)| {
                let Some(envelope) = compute_envelope(polygon) else {
                    log::warn!("Owner slot {slot} has an empty footprint, skipping");
                    return None;
                };
                Some(OwnerEntry {
                    slot,
                    envelope,
                    polygon: polygon.clone(),
                })
            })
            .collect();

        let owners = RTree::bulk_load(entries);
        log::debug!("Built owner index with {} footprints", owners.size());

        Self { owners }
    }

    /// Number of indexed footprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.size()
    }

    /// Whether the index holds no footprints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.size() == 0
    }

    /// Slots of every owner footprint the geometry intersects, ascending.
    ///
    /// Footprints can overlap, so a geometry may match more than one
    /// owner. An empty result means the geometry lies on no owner's land.
    #[must_use]
    pub fn owners_intersecting(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(query_env) = compute_envelope(geometry) else {
            return Vec::new();
        };

        let mut slots: Vec<usize> = self
            .owners
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(geometry))
            .map(|entry| entry.slot)
            .collect();
        slots.sort_unstable();
        slots
    }
}

/// Compute the bounding box envelope of any geometry.
///
/// Returns `None` for empty geometries.
pub fn compute_envelope<G>(geometry: &G) -> Option<AABB<[f64; 2]>>
where
    G: BoundingRect<f64>,
    G::Output: Into<Option<geo::Rect<f64>>>,
{
    let rect: Option<geo::Rect<f64>> = geometry.bounding_rect().into();
    rect.map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Converts a `GeoJSON` geometry into a [`geo::Geometry`].
///
/// # Errors
///
/// Returns [`SpatialError::GeoJson`] if the geometry cannot be converted.
pub fn geometry_from_geojson(geometry: geojson::Geometry) -> Result<Geometry<f64>, SpatialError> {
    Ok(Geometry::<f64>::try_from(geometry)?)
}

/// Converts a [`geo::Geometry`] into a [`MultiPolygon`].
///
/// Handles both `Polygon` and `MultiPolygon` geometry types.
///
/// # Errors
///
/// Returns [`SpatialError::MalformedGeometry`] for any other geometry type.
pub fn into_multi_polygon(geometry: Geometry<f64>) -> Result<MultiPolygon<f64>, SpatialError> {
    match geometry {
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(SpatialError::MalformedGeometry(format!(
            "expected Polygon or MultiPolygon, found {}",
            geometry_type_name(&other)
        ))),
    }
}

/// Parses a `GeoJSON` document into its features.
///
/// Accepts a `FeatureCollection` or a single `Feature`.
///
/// # Errors
///
/// Returns [`SpatialError`] if the text is not valid `GeoJSON` or is a
/// bare geometry.
pub fn parse_features(geojson_str: &str) -> Result<Vec<geojson::Feature>, SpatialError> {
    match geojson_str.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(SpatialError::MalformedGeometry(
            "expected a FeatureCollection, found a bare geometry".to_string(),
        )),
    }
}

/// Checks that every coordinate of a geometry is finite.
///
/// # Errors
///
/// Returns [`SpatialError::MalformedGeometry`] on the first `NaN` or
/// infinite coordinate.
pub fn ensure_finite(geometry: &Geometry<f64>) -> Result<(), SpatialError> {
    use geo::CoordsIter;

    if geometry
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(SpatialError::MalformedGeometry(
            "geometry contains non-finite coordinates".to_string(),
        ));
    }
    Ok(())
}

const fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn finds_containing_owner() {
        let owners = [square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)];
        let index = OwnerIndex::build(&owners);

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.owners_intersecting(&Point::new(25.0, 5.0).into()),
            vec![1]
        );
        assert_eq!(
            index.owners_intersecting(&Point::new(5.0, 5.0).into()),
            vec![0]
        );
    }

    #[test]
    fn point_outside_all_owners_matches_nothing() {
        let owners = [square(0.0, 0.0, 10.0)];
        let index = OwnerIndex::build(&owners);

        assert!(
            index
                .owners_intersecting(&Point::new(15.0, 15.0).into())
                .is_empty()
        );
    }

    #[test]
    fn overlapping_owners_both_match() {
        let owners = [square(0.0, 0.0, 10.0), square(5.0, 0.0, 10.0)];
        let index = OwnerIndex::build(&owners);

        assert_eq!(
            index.owners_intersecting(&Point::new(7.0, 5.0).into()),
            vec![0, 1]
        );
    }

    #[test]
    fn converts_polygon_to_multi_polygon() {
        let mut owner = square(0.0, 0.0, 1.0);
        let polygon = owner.0.remove(0);
        let mp = into_multi_polygon(Geometry::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn rejects_point_as_multi_polygon() {
        let err = into_multi_polygon(Point::new(1.0, 1.0).into()).unwrap_err();
        assert!(err.to_string().contains("Point"), "{err}");
    }

    #[test]
    fn parses_feature_collection() {
        let features = parse_features(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"DIAMETER":8},
                 "geometry":{"type":"Point","coordinates":[-89.6,39.9]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let geometry: Geometry<f64> = Point::new(f64::NAN, 1.0).into();
        assert!(ensure_finite(&geometry).is_err());
        assert!(ensure_finite(&Point::new(1.0, 1.0).into()).is_ok());
    }
}

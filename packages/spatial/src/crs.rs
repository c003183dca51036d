//! Coordinate reference systems and the WGS84 → UTM projection.
//!
//! Distance-based clustering is only meaningful in a metric projection,
//! so detections stored as longitude/latitude are projected into a
//! region-specific UTM zone before any buffering. The zone is part of the
//! run configuration.

use std::fmt;
use std::str::FromStr;

use geo::{Coord, Geometry, MapCoords};
use serde::{Deserialize, Serialize};

use crate::{SpatialError, ensure_finite};

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central meridian scale factor.
const UTM_K0: f64 = 0.9996;

const UTM_FALSE_EASTING: f64 = 500_000.0;

const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// How far (in degrees of longitude) a point may sit from the zone's
/// central meridian before it is treated as belonging to another region.
const MAX_ZONE_OFFSET_DEG: f64 = 12.0;

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    /// EPSG:326NN
    North,
    /// EPSG:327NN
    South,
}

/// A coordinate reference system understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Geographic WGS84 longitude/latitude in degrees (EPSG:4326).
    Wgs84,
    /// WGS84 / UTM, meters.
    Utm {
        /// Zone number, 1 through 60.
        zone: u8,
        /// Hemisphere of the zone.
        hemisphere: Hemisphere,
    },
}

impl Crs {
    /// EPSG code of this coordinate system.
    #[must_use]
    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Utm {
                zone,
                hemisphere: Hemisphere::North,
            } => 32600 + u32::from(zone),
            Self::Utm {
                zone,
                hemisphere: Hemisphere::South,
            } => 32700 + u32::from(zone),
        }
    }

    /// Whether coordinates in this system are expressed in meters.
    #[must_use]
    pub const fn is_metric(self) -> bool {
        matches!(self, Self::Utm { .. })
    }

    /// Builds a coordinate system from its EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownCrs`] for codes other than 4326 and
    /// the WGS84 UTM zones.
    pub fn from_epsg(code: u32) -> Result<Self, SpatialError> {
        let hemisphere = match code {
            4326 => return Ok(Self::Wgs84),
            32601..=32660 => Hemisphere::North,
            32701..=32760 => Hemisphere::South,
            _ => return Err(SpatialError::UnknownCrs(format!("EPSG:{code}"))),
        };
        #[allow(clippy::cast_possible_truncation)]
        let zone = (code % 100) as u8;
        Ok(Self::Utm { zone, hemisphere })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);

        code.parse::<u32>()
            .map_err(|_| SpatialError::UnknownCrs(s.to_string()))
            .and_then(Self::from_epsg)
    }
}

impl TryFrom<String> for Crs {
    type Error = SpatialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

/// Reprojects a geometry from one coordinate system to another.
///
/// # Errors
///
/// Returns [`SpatialError::UnsupportedProjection`] when no projection
/// exists between the two systems, [`SpatialError::CrsMismatch`] when a
/// coordinate is not a plausible position in `from` or lies too far from
/// the target zone, and [`SpatialError::MalformedGeometry`] for
/// non-finite coordinates.
pub fn project_geometry(
    geometry: &Geometry<f64>,
    from: Crs,
    to: Crs,
) -> Result<Geometry<f64>, SpatialError> {
    ensure_finite(geometry)?;

    match (from, to) {
        (a, b) if a == b => Ok(geometry.clone()),
        (Crs::Wgs84, Crs::Utm { zone, hemisphere }) => {
            geometry.try_map_coords(move |c| utm_forward(c, zone, hemisphere))
        }
        (from, to) => Err(SpatialError::UnsupportedProjection { from, to }),
    }
}

/// Longitude of the central meridian of a UTM zone, in degrees.
fn central_meridian(zone: u8) -> f64 {
    f64::from(zone).mul_add(6.0, -183.0)
}

/// Transverse Mercator forward projection (Snyder, USGS PP 1395).
fn utm_forward(c: Coord<f64>, zone: u8, hemisphere: Hemisphere) -> Result<Coord<f64>, SpatialError> {
    let (lon, lat) = (c.x, c.y);
    let crs = Crs::Utm { zone, hemisphere };
    let mismatch = |reason: String| SpatialError::CrsMismatch {
        crs: Crs::Wgs84,
        x: lon,
        y: lat,
        reason,
    };

    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(mismatch(
            "not a longitude/latitude pair; is the input already projected?".to_string(),
        ));
    }

    let lon0 = central_meridian(zone);
    if (lon - lon0).abs() > MAX_ZONE_OFFSET_DEG {
        return Err(mismatch(format!(
            "longitude is more than {MAX_ZONE_OFFSET_DEG} degrees from the central meridian of {crs}"
        )));
    }

    let e2 = WGS84_F * (2.0 - WGS84_F);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let phi = lat.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = WGS84_A / e2.mul_add(-sin_phi * sin_phi, 1.0).sqrt();
    let t = tan_phi * tan_phi;
    let cc = ep2 * cos_phi * cos_phi;
    let a = cos_phi * (lon - lon0).to_radians();

    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let x = UTM_K0
        * n
        * (a + (1.0 - t + cc) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * cc - 58.0 * ep2) * a5 / 120.0)
        + UTM_FALSE_EASTING;

    let mut y = UTM_K0
        * (m + n
            * tan_phi
            * (a2 / 2.0
                + (5.0 - t + 9.0 * cc + 4.0 * cc * cc) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * cc - 330.0 * ep2) * a6 / 720.0));

    if hemisphere == Hemisphere::South {
        y += UTM_FALSE_NORTHING_SOUTH;
    }

    Ok(Coord { x, y })
}

//! Buffered proximity self-join.
//!
//! Buffering every geometry by `d` and intersecting the buffers pairwise
//! is equivalent to asking whether two geometries lie within `2·d` of each
//! other, which is what this module computes. An R-tree over envelopes
//! grown by `d` narrows the candidates; the exact Euclidean distance
//! decides. Coordinates must already be in a metric projection.

use geo::{Distance, Euclidean, Geometry};
use rstar::{AABB, RTree, RTreeObject};

use crate::{SpatialError, compute_envelope};

/// A buffered geometry stored in the R-tree with its input position.
struct BufferedEntry<'a> {
    position: usize,
    envelope: AABB<[f64; 2]>,
    geometry: &'a Geometry<f64>,
}

impl RTreeObject for BufferedEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Counts, for every geometry, how many buffered geometries intersect its
/// own buffer. Each geometry always intersects itself, so every count is
/// at least one.
///
/// Counts are returned in input order.
///
/// # Errors
///
/// Returns [`SpatialError::MalformedGeometry`] if the buffer distance is
/// negative or non-finite, or if a geometry is empty.
pub fn buffered_intersection_counts(
    geometries: &[Geometry<f64>],
    buffer_distance: f64,
) -> Result<Vec<usize>, SpatialError> {
    if !buffer_distance.is_finite() || buffer_distance < 0.0 {
        return Err(SpatialError::MalformedGeometry(format!(
            "buffer distance must be a non-negative number of meters, got {buffer_distance}"
        )));
    }

    let entries = geometries
        .iter()
        .enumerate()
        .map(|(position, geometry)| {
            let envelope = compute_envelope(geometry).ok_or_else(|| {
                SpatialError::MalformedGeometry(format!("geometry {position} is empty"))
            })?;
            Ok(BufferedEntry {
                position,
                envelope: grow(&envelope, buffer_distance),
                geometry,
            })
        })
        .collect::<Result<Vec<_>, SpatialError>>()?;

    let tree = RTree::bulk_load(entries);
    let reach = 2.0 * buffer_distance;
    let mut counts = vec![0; geometries.len()];

    for entry in tree.iter() {
        counts[entry.position] = tree
            .locate_in_envelope_intersecting(&entry.envelope)
            .filter(|other| {
                other.position == entry.position
                    || Euclidean.distance(entry.geometry, other.geometry) <= reach
            })
            .count();
    }

    Ok(counts)
}

fn grow(envelope: &AABB<[f64; 2]>, by: f64) -> AABB<[f64; 2]> {
    let (lower, upper) = (envelope.lower(), envelope.upper());
    AABB::from_corners([lower[0] - by, lower[1] - by], [upper[0] + by, upper[1] + by])
}

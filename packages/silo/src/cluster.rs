//! Size and proximity filtering of silo detections.

use std::collections::BTreeSet;

use farm_leads_config::ClusterSettings;
use farm_leads_silo_models::SiloDetection;
use farm_leads_spatial::project_geometry;
use farm_leads_spatial::proximity::buffered_intersection_counts;
use geo::Geometry;

use crate::SiloError;

/// Keeps detections of plausible size that sit in a cluster.
///
/// A detection survives when its diameter is within
/// `[min_diameter, max_diameter]` and, after buffering every surviving
/// detection by `cluster_distance_m` in `distance_crs`, at least
/// `cluster_size` buffers intersect its own. The detection's own buffer is
/// part of that count, so `cluster_size = 3` means two neighbors.
///
/// The returned detections are the untouched input records, in input
/// order.
///
/// # Errors
///
/// Returns [`SiloError::Config`] for invalid settings and
/// [`SiloError::Projection`] when a detection cannot be projected into the
/// distance coordinate system (wrong source system, malformed geometry).
pub fn filter_clustered_silos(
    detections: &[SiloDetection],
    settings: &ClusterSettings,
) -> Result<Vec<SiloDetection>, SiloError> {
    settings.validate()?;

    let sized: Vec<&SiloDetection> = detections
        .iter()
        .filter(|d| d.diameter_within(settings.min_diameter, settings.max_diameter))
        .collect();

    log::info!(
        "{} of {} detections have a diameter within [{}, {}] m",
        sized.len(),
        detections.len(),
        settings.min_diameter,
        settings.max_diameter
    );

    let projected = sized
        .iter()
        .map(|d| {
            project_geometry(&d.geometry, settings.source_crs, settings.distance_crs)
                .map_err(|source| SiloError::Projection { id: d.id, source })
        })
        .collect::<Result<Vec<Geometry<f64>>, SiloError>>()?;

    let counts = buffered_intersection_counts(&projected, settings.cluster_distance_m)?;

    let clustered_ids: BTreeSet<usize> = sized
        .iter()
        .zip(&counts)
        .filter(|&(_, &count)| count >= settings.cluster_size)
        .map(|(d, _)| d.id)
        .collect();

    let clustered: Vec<SiloDetection> = detections
        .iter()
        .filter(|d| clustered_ids.contains(&d.id))
        .cloned()
        .collect();

    log::info!(
        "{} detections sit in clusters of at least {} within {} m",
        clustered.len(),
        settings.cluster_size,
        settings.cluster_distance_m
    );

    Ok(clustered)
}

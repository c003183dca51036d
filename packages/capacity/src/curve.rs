//! Per-tier curve fitting.

use std::collections::BTreeMap;

use farm_leads_capacity_models::{ReferenceDiameter, ReferenceRow, TierCurve, TierCurves};

use crate::CapacityError;

/// Fits one curve per tier label found in the table.
///
/// Rows sharing a diameter and tier are summed first, as a cross-tab of
/// the table would; rows without a capacity are left out. Each tier's
/// `(diameter, ln(capacity))` points are fitted by ordinary least squares,
/// giving `ln(capacity) = slope * diameter + ln(intercept)`.
///
/// # Errors
///
/// Returns [`CapacityError::InsufficientData`] for the first tier (in
/// label order) with fewer than two distinct diameters. Every tier must
/// fit, since any of them may bound an estimate.
pub fn fit_tier_curves(rows: &[ReferenceRow]) -> Result<TierCurves, CapacityError> {
    let mut points: BTreeMap<&str, BTreeMap<ReferenceDiameter, f64>> = BTreeMap::new();

    for row in rows {
        let tier_points = points.entry(row.tier.as_str()).or_default();
        if let Some(bushels) = row.bushels {
            *tier_points.entry(ReferenceDiameter(row.diameter_m)).or_default() += bushels;
        }
    }

    points
        .into_iter()
        .map(|(tier, tier_points)| {
            let curve = fit_power_curve(&tier_points).ok_or_else(|| {
                CapacityError::InsufficientData {
                    tier: tier.to_string(),
                    points: tier_points.len(),
                }
            })?;
            log::debug!(
                "Tier {tier}: slope={:.6} intercept={:.6} from {} points",
                curve.slope,
                curve.intercept,
                tier_points.len()
            );
            Ok((tier.to_string(), curve))
        })
        .collect()
}

/// Least-squares fit of `ln(capacity)` against diameter.
///
/// Returns `None` with fewer than two points.
fn fit_power_curve(points: &BTreeMap<ReferenceDiameter, f64>) -> Option<TierCurve> {
    if points.len() < 2 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.keys().map(|d| d.meters()).sum::<f64>() / n;
    let mean_y = points.values().map(|c| c.ln()).sum::<f64>() / n;

    let (sxx, sxy) = points
        .iter()
        .fold((0.0, 0.0), |(sxx, sxy), (diameter, capacity)| {
            let dx = diameter.meters() - mean_x;
            let dy = capacity.ln() - mean_y;
            (dx.mul_add(dx, sxx), dx.mul_add(dy, sxy))
        });

    let slope = sxy / sxx;
    let log_intercept = slope.mul_add(-mean_x, mean_y);

    Some(TierCurve {
        slope,
        intercept: log_intercept.exp(),
    })
}

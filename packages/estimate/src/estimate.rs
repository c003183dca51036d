//! Low/high capacity estimate per silo.

use farm_leads_capacity_models::{TierBrackets, TierCurves};
use farm_leads_estimate_models::{CapacityEstimate, EstimatedSilo};
use farm_leads_silo_models::SiloDetection;

use crate::EstimateError;

/// Estimates the capacity range of each silo.
///
/// The bracket of the reference diameter nearest the silo's diameter
/// (ties going to the smaller reference diameter) selects two tiers. Each
/// tier's curve is applied to the silo's own diameter: the smaller tier
/// gives the low estimate, the larger the high one.
///
/// # Errors
///
/// Returns [`EstimateError`] if there are no brackets, a bracket names a
/// tier without a curve, or an estimate is not finite.
pub fn estimate(
    silos: &[SiloDetection],
    curves: &TierCurves,
    brackets: &TierBrackets,
) -> Result<Vec<EstimatedSilo>, EstimateError> {
    let estimated = silos
        .iter()
        .map(|silo| {
            let estimate = estimate_one(silo, curves, brackets)?;
            log::debug!(
                "Silo {} ({} m): reference {} m, tiers {}..{}, {:.0}-{:.0} bu",
                silo.id,
                silo.diameter,
                estimate.reference_diameter,
                estimate.bracket.min_tier,
                estimate.bracket.max_tier,
                estimate.low,
                estimate.high
            );
            Ok(EstimatedSilo {
                silo: silo.clone(),
                estimate,
            })
        })
        .collect::<Result<Vec<_>, EstimateError>>()?;

    log::info!("Estimated capacity for {} silos", estimated.len());
    Ok(estimated)
}

fn estimate_one(
    silo: &SiloDetection,
    curves: &TierCurves,
    brackets: &TierBrackets,
) -> Result<CapacityEstimate, EstimateError> {
    let (reference, bracket) = brackets
        .nearest(silo.diameter)
        .ok_or(EstimateError::NoReferenceDiameter { silo_id: silo.id })?;

    let capacity = |tier: &str| -> Result<f64, EstimateError> {
        let curve = curves.get(tier).ok_or_else(|| EstimateError::UnknownTier {
            silo_id: silo.id,
            tier: tier.to_string(),
            diameter: reference.meters(),
        })?;
        let bushels = curve.capacity_at(silo.diameter);
        if bushels.is_finite() {
            Ok(bushels)
        } else {
            Err(EstimateError::NonFiniteEstimate {
                silo_id: silo.id,
                diameter: silo.diameter,
            })
        }
    };

    Ok(CapacityEstimate {
        low: capacity(&bracket.min_tier)?,
        high: capacity(&bracket.max_tier)?,
        reference_diameter: reference.meters(),
        bracket: bracket.clone(),
    })
}

//! Per-diameter tier brackets.

use std::collections::BTreeMap;

use farm_leads_capacity_models::{
    ReferenceDiameter, ReferenceRow, TierBracket, TierBrackets, TierCurves, TierOrdering,
};

use crate::CapacityError;

/// Smallest and largest tier listed at each reference diameter.
///
/// Every row counts, including rows without a capacity. Labels are
/// compared with `ordering`; under [`TierOrdering::Lexical`] `"10"` sorts
/// before `"2"`.
#[must_use]
pub fn tier_bracket_by_diameter(rows: &[ReferenceRow], ordering: TierOrdering) -> TierBrackets {
    let mut by_diameter: BTreeMap<ReferenceDiameter, TierBracket> = BTreeMap::new();

    for row in rows {
        by_diameter
            .entry(ReferenceDiameter(row.diameter_m))
            .and_modify(|bracket| {
                if ordering.compare(&row.tier, &bracket.min_tier).is_lt() {
                    bracket.min_tier.clone_from(&row.tier);
                }
                if ordering.compare(&row.tier, &bracket.max_tier).is_gt() {
                    bracket.max_tier.clone_from(&row.tier);
                }
            })
            .or_insert_with(|| TierBracket {
                min_tier: row.tier.clone(),
                max_tier: row.tier.clone(),
            });
    }

    log::info!(
        "Built tier brackets for {} reference diameters ({ordering} tier order)",
        by_diameter.len()
    );

    TierBrackets::new(by_diameter)
}

/// Checks that every tier named in a bracket has a fitted curve.
///
/// # Errors
///
/// Returns [`CapacityError::MissingCurve`] for the first uncovered tier.
pub fn ensure_coverage(curves: &TierCurves, brackets: &TierBrackets) -> Result<(), CapacityError> {
    for (diameter, bracket) in brackets.iter() {
        for tier in [&bracket.min_tier, &bracket.max_tier] {
            if !curves.contains_key(tier) {
                return Err(CapacityError::MissingCurve {
                    tier: tier.clone(),
                    diameter: diameter.meters(),
                });
            }
        }
    }
    Ok(())
}

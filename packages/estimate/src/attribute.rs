//! Assigns estimated silos to owners and sums their capacity.

use farm_leads_estimate_models::{EstimatedSilo, LeadRecord};
use farm_leads_parcel_models::OwnerAggregate;
use farm_leads_spatial::OwnerIndex;

/// Builds one lead per owner, summing the estimates of the silos that
/// stand on the owner's farmland.
///
/// Owners keep their input order and are never dropped: an owner without
/// silos gets zero estimates. A silo on no owner's land contributes
/// nothing; a silo touching several owners' footprints counts for each.
#[must_use]
pub fn attribute(estimated: &[EstimatedSilo], owners: Vec<OwnerAggregate>) -> Vec<LeadRecord> {
    let index = OwnerIndex::build(owners.iter().map(|owner| &owner.geometry));
    let mut leads: Vec<LeadRecord> = owners.into_iter().map(LeadRecord::from_owner).collect();
    let mut unmatched = 0usize;

    for silo in estimated {
        let slots = index.owners_intersecting(&silo.silo.geometry);
        if slots.is_empty() {
            unmatched += 1;
            continue;
        }

        for slot in slots {
            let lead = &mut leads[slot];
            lead.min_capacity_est += silo.estimate.low;
            lead.max_capacity_est += silo.estimate.high;
            lead.silo_count += 1;
        }
    }

    let with_storage = leads.iter().filter(|lead| lead.silo_count > 0).count();
    log::info!(
        "Attributed {} of {} silos to {with_storage} of {} owners",
        estimated.len() - unmatched,
        estimated.len(),
        leads.len()
    );
    if nothing_matched(estimated.len(), unmatched, leads.len()) {
        log::warn!(
            "None of {} silos fall on any of {} owners' farmland; check that the \
             silo and parcel layers share a coordinate system",
            estimated.len(),
            leads.len()
        );
    } else if unmatched > 0 {
        log::info!("{unmatched} silos lie outside every owner's farmland");
    }

    leads
}

/// Whether there were silos and owners but no silo landed on any owner,
/// the usual symptom of layers in different coordinate systems.
const fn nothing_matched(silos: usize, unmatched: usize, owners: usize) -> bool {
    silos > 0 && owners > 0 && unmatched == silos
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_leads_capacity::{ensure_coverage, fit_tier_curves, tier_bracket_by_diameter};
    use farm_leads_capacity_models::{ReferenceRow, TierBracket, TierOrdering};
    use farm_leads_estimate_models::CapacityEstimate;
    use farm_leads_parcel::aggregate_owners;
    use farm_leads_parcel_models::{ContactInfo, Parcel};
    use farm_leads_silo_models::SiloDetection;
    use geo::{MultiPolygon, Point, polygon};

    use crate::estimate;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn owner(name: &str, acres: f64, footprint: MultiPolygon<f64>) -> OwnerAggregate {
        OwnerAggregate {
            owner: name.to_string(),
            geometry: footprint,
            farm_acres: acres,
            contact: ContactInfo::default(),
        }
    }

    fn estimated(id: usize, x: f64, y: f64, low: f64, high: f64) -> EstimatedSilo {
        EstimatedSilo {
            silo: SiloDetection {
                id,
                diameter: 8.0,
                geometry: Point::new(x, y).into(),
            },
            estimate: CapacityEstimate {
                low,
                high,
                reference_diameter: 8.0,
                bracket: TierBracket {
                    min_tier: "1".to_string(),
                    max_tier: "2".to_string(),
                },
            },
        }
    }

    #[test]
    fn sums_estimates_per_owner() {
        let owners = vec![
            owner("A", 100.0, square(0.0, 0.0, 10.0)),
            owner("B", 50.0, square(20.0, 0.0, 10.0)),
        ];
        let silos = vec![
            estimated(0, 1.0, 1.0, 100.0, 150.0),
            estimated(1, 2.0, 2.0, 200.0, 250.0),
            estimated(2, 25.0, 5.0, 10.0, 20.0),
        ];

        let leads = attribute(&silos, owners);

        assert_eq!(leads[0].owner, "A");
        assert!((leads[0].min_capacity_est - 300.0).abs() < 1e-9);
        assert!((leads[0].max_capacity_est - 400.0).abs() < 1e-9);
        assert_eq!(leads[0].silo_count, 2);
        assert!((leads[1].min_capacity_est - 10.0).abs() < 1e-9);
        assert_eq!(leads[1].silo_count, 1);
    }

    #[test]
    fn silos_in_another_coordinate_system_match_nothing() {
        // Owners in degrees, silos in projected meters.
        let owners = vec![owner("A", 100.0, square(-89.91, 39.99, 0.02))];
        let silos = vec![
            estimated(0, 247_000.0, 4_430_000.0, 100.0, 150.0),
            estimated(1, 247_010.0, 4_430_000.0, 100.0, 150.0),
        ];

        let leads = attribute(&silos, owners);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].silo_count, 0);
        assert!(nothing_matched(silos.len(), 2, leads.len()));
    }

    #[test]
    fn partial_matches_are_not_reported_as_mismatch() {
        assert!(!nothing_matched(3, 1, 2));
        assert!(!nothing_matched(0, 0, 2), "no silos at all");
        assert!(!nothing_matched(3, 3, 0), "no owners at all");
    }

    #[test]
    fn owners_without_silos_are_kept_with_zero_estimates() {
        let owners = vec![
            owner("A", 100.0, square(0.0, 0.0, 10.0)),
            owner("B", 50.0, square(20.0, 0.0, 10.0)),
        ];

        let leads = attribute(&[estimated(0, 1.0, 1.0, 5.0, 6.0)], owners);

        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].owner, "B");
        assert!((leads[1].farm_acres - 50.0).abs() < f64::EPSILON);
        assert!(leads[1].min_capacity_est.abs() < f64::EPSILON);
        assert!(leads[1].max_capacity_est.abs() < f64::EPSILON);
        assert_eq!(leads[1].silo_count, 0);
    }

    #[test]
    fn silos_outside_all_owners_are_dropped() {
        let owners = vec![owner("A", 100.0, square(0.0, 0.0, 10.0))];

        let leads = attribute(&[estimated(0, 50.0, 50.0, 5.0, 6.0)], owners);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].silo_count, 0);
    }

    #[test]
    fn silo_on_shared_boundary_counts_for_both_owners() {
        let owners = vec![
            owner("A", 1.0, square(0.0, 0.0, 10.0)),
            owner("B", 1.0, square(10.0, 0.0, 10.0)),
        ];

        let leads = attribute(&[estimated(0, 10.0, 5.0, 5.0, 6.0)], owners);

        assert_eq!(leads[0].silo_count, 1);
        assert_eq!(leads[1].silo_count, 1);
    }

    #[test]
    fn end_to_end_single_silo_scenario() {
        let reference = vec![
            ReferenceRow {
                diameter_m: 4.0,
                tier: "1".to_string(),
                bushels: Some(50.0),
            },
            ReferenceRow {
                diameter_m: 8.0,
                tier: "1".to_string(),
                bushels: Some(400.0),
            },
            ReferenceRow {
                diameter_m: 4.0,
                tier: "2".to_string(),
                bushels: Some(70.0),
            },
            ReferenceRow {
                diameter_m: 8.0,
                tier: "2".to_string(),
                bushels: Some(560.0),
            },
        ];
        let curves = fit_tier_curves(&reference).unwrap();
        let brackets = tier_bracket_by_diameter(&reference, TierOrdering::Lexical);
        ensure_coverage(&curves, &brackets).unwrap();

        let parcels = vec![
            Parcel {
                owner_id: "GRAIN FARMS LLC".to_string(),
                farm_acres: 100.0,
                geometry: square(0.0, 0.0, 100.0),
                contact: ContactInfo {
                    mail_address: Some("100 FARM RD".to_string()),
                    mail_city_state_zip: Some("PETERSBURG IL 62675".to_string()),
                },
            },
            Parcel {
                owner_id: "NO SILO ACRES".to_string(),
                farm_acres: 40.0,
                geometry: square(500.0, 0.0, 100.0),
                contact: ContactInfo::default(),
            },
        ];
        let owners = aggregate_owners(&parcels);

        let silo = SiloDetection {
            id: 0,
            diameter: 6.0,
            geometry: Point::new(50.0, 50.0).into(),
        };
        let estimated_silos = estimate(&[silo], &curves, &brackets).unwrap();

        let e = &estimated_silos[0].estimate;
        assert!(
            (e.reference_diameter - 4.0).abs() < f64::EPSILON,
            "equidistant diameter resolves to the smaller reference"
        );
        assert_eq!(e.bracket.min_tier, "1");
        assert_eq!(e.bracket.max_tier, "2");
        assert!((e.low - curves["1"].capacity_at(6.0)).abs() < 1e-9);
        assert!((e.high - curves["2"].capacity_at(6.0)).abs() < 1e-9);
        assert!(e.low < e.high);

        let leads = attribute(&estimated_silos, owners);

        assert_eq!(leads.len(), 2);
        let farm = &leads[0];
        assert_eq!(farm.owner, "GRAIN FARMS LLC");
        assert!((farm.farm_acres - 100.0).abs() < f64::EPSILON);
        assert!((farm.min_capacity_est - e.low).abs() < 1e-9);
        assert!((farm.max_capacity_est - e.high).abs() < 1e-9);
        assert_eq!(farm.contact.mail_address.as_deref(), Some("100 FARM RD"));

        let idle = &leads[1];
        assert_eq!(idle.owner, "NO SILO ACRES");
        assert!((idle.farm_acres - 40.0).abs() < f64::EPSILON);
        assert!(idle.min_capacity_est.abs() < f64::EPSILON);
        assert!(idle.max_capacity_est.abs() < f64::EPSILON);
    }
}

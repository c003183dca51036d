//! Merges farmland parcels per owner.

use std::collections::BTreeMap;

use farm_leads_parcel_models::{ContactInfo, OwnerAggregate, Parcel};
use geo::{BooleanOps, MultiPolygon};

/// Parcels of one owner collected before dissolving.
struct OwnerGroup<'a> {
    owner: String,
    footprints: Vec<&'a MultiPolygon<f64>>,
    farm_acres: f64,
    contact: ContactInfo,
}

/// Groups farmland parcels by normalized owner.
///
/// Only parcels with positive acreage take part. Each owner's footprints
/// are dissolved into one multi-polygon and their acreage summed; the
/// contact details of the owner's first farmland parcel are kept and later
/// ones ignored. Results are ordered by descending acreage, ties keeping
/// the order in which owners first appear.
#[must_use]
pub fn aggregate_owners(parcels: &[Parcel]) -> Vec<OwnerAggregate> {
    let mut slots: BTreeMap<&str, usize> = BTreeMap::new();
    let mut groups: Vec<OwnerGroup<'_>> = Vec::new();
    let mut qualifying = 0usize;

    for parcel in parcels.iter().filter(|p| p.is_farmland()) {
        qualifying += 1;
        let owner = parcel.normalized_owner();
        let slot = *slots.entry(owner).or_insert_with(|| {
            groups.push(OwnerGroup {
                owner: owner.to_string(),
                footprints: Vec::new(),
                farm_acres: 0.0,
                contact: parcel.contact.clone(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.footprints.push(&parcel.geometry);
        group.farm_acres += parcel.farm_acres;
    }

    let mut aggregates: Vec<OwnerAggregate> = groups
        .into_iter()
        .map(|group| OwnerAggregate {
            geometry: dissolve(&group.footprints),
            owner: group.owner,
            farm_acres: group.farm_acres,
            contact: group.contact,
        })
        .collect();

    // `sort_by` is stable, so equal acreage keeps first-seen order.
    aggregates.sort_by(|a, b| b.farm_acres.total_cmp(&a.farm_acres));

    log::info!(
        "Aggregated {qualifying} of {} parcels into {} farmland owners",
        parcels.len(),
        aggregates.len()
    );

    aggregates
}

/// Unions footprints into a single multi-polygon.
fn dissolve(footprints: &[&MultiPolygon<f64>]) -> MultiPolygon<f64> {
    match footprints {
        [] => MultiPolygon(Vec::new()),
        [only] => (*only).clone(),
        [first, rest @ ..] => rest
            .iter()
            .fold((*first).clone(), |merged, footprint| merged.union(*footprint)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, polygon};

    fn square(x0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: 0.0),
            (x: x0 + size, y: 0.0),
            (x: x0 + size, y: size),
            (x: x0, y: size),
            (x: x0, y: 0.0),
        ]])
    }

    fn parcel(owner: &str, acres: f64, x0: f64, address: &str) -> Parcel {
        Parcel {
            owner_id: owner.to_string(),
            farm_acres: acres,
            geometry: square(x0, 1.0),
            contact: ContactInfo {
                mail_address: Some(address.to_string()),
                mail_city_state_zip: Some("PETERSBURG IL 62675".to_string()),
            },
        }
    }

    #[test]
    fn merges_owners_differing_only_by_whitespace() {
        let parcels = vec![
            parcel("SMITH FARMS", 40.0, 0.0, "1 MAIN"),
            parcel("  SMITH FARMS ", 60.0, 1.0, "2 MAIN"),
        ];

        let owners = aggregate_owners(&parcels);

        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].owner, "SMITH FARMS");
        assert!((owners[0].farm_acres - 100.0).abs() < 1e-9);
    }

    #[test]
    fn sums_only_qualifying_parcels() {
        let parcels = vec![
            parcel("A", 10.0, 0.0, "1"),
            parcel("A", 0.0, 5.0, "2"),
            parcel("A", 15.5, 10.0, "3"),
            parcel("B", 0.0, 20.0, "4"),
        ];

        let owners = aggregate_owners(&parcels);

        assert_eq!(owners.len(), 1, "owner B has no farmland");
        assert!((owners[0].farm_acres - 25.5).abs() < 1e-9);
        assert!(
            (owners[0].geometry.unsigned_area() - 2.0).abs() < 1e-9,
            "the zero-acre parcel must not join the footprint"
        );
    }

    #[test]
    fn dissolves_adjacent_footprints() {
        let parcels = vec![parcel("A", 1.0, 0.0, "1"), parcel("A", 1.0, 1.0, "1")];

        let owners = aggregate_owners(&parcels);

        assert!((owners[0].geometry.unsigned_area() - 2.0).abs() < 1e-9);
        assert_eq!(owners[0].geometry.0.len(), 1, "touching squares merge");
    }

    #[test]
    fn first_contact_wins() {
        let parcels = vec![
            parcel("A", 1.0, 0.0, "FIRST"),
            parcel("A", 1.0, 3.0, "SECOND"),
        ];

        let owners = aggregate_owners(&parcels);

        assert_eq!(owners[0].contact.mail_address.as_deref(), Some("FIRST"));
    }

    #[test]
    fn contact_comes_from_first_farmland_parcel() {
        let parcels = vec![
            parcel("A", 0.0, 0.0, "NOT FARMLAND"),
            parcel("A", 3.0, 3.0, "FARMLAND"),
        ];

        let owners = aggregate_owners(&parcels);

        assert_eq!(owners[0].contact.mail_address.as_deref(), Some("FARMLAND"));
    }

    #[test]
    fn orders_by_descending_acreage_with_stable_ties() {
        let parcels = vec![
            parcel("LOW", 5.0, 0.0, "1"),
            parcel("TIE_FIRST", 50.0, 2.0, "2"),
            parcel("HIGH", 500.0, 4.0, "3"),
            parcel("TIE_SECOND", 50.0, 6.0, "4"),
        ];

        let owners: Vec<String> = aggregate_owners(&parcels)
            .into_iter()
            .map(|o| o.owner)
            .collect();

        assert_eq!(owners, ["HIGH", "TIE_FIRST", "TIE_SECOND", "LOW"]);
    }

    #[test]
    fn empty_input_yields_no_owners() {
        assert!(aggregate_owners(&[]).is_empty());
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types for the silo capacity model.
//!
//! A manufacturer reference table lists, for each bin diameter and tier
//! (ring count), the storage capacity in bushels. From it the pipeline
//! derives one power-law [`TierCurve`] per tier and, per reference
//! diameter, the [`TierBracket`] of the smallest and largest tier offered.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One row of the reference capacity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    /// Bin diameter in meters.
    pub diameter_m: f64,
    /// Tier label as it appears in the table (e.g. `"7"`).
    pub tier: String,
    /// Capacity in bushels, if the table lists one.
    pub bushels: Option<f64>,
}

/// A reference diameter usable as an ordered map key.
///
/// Ordered with [`f64::total_cmp`]; the capacity loader only admits
/// finite positive diameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReferenceDiameter(pub f64);

impl ReferenceDiameter {
    /// Diameter in meters.
    #[must_use]
    pub const fn meters(self) -> f64 {
        self.0
    }
}

impl PartialEq for ReferenceDiameter {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReferenceDiameter {}

impl PartialOrd for ReferenceDiameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReferenceDiameter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Power-law curve `capacity = intercept * diameter^slope` for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierCurve {
    /// Exponent applied to the diameter.
    pub slope: f64,
    /// Multiplicative constant (exp of the fitted log-space intercept).
    pub intercept: f64,
}

impl TierCurve {
    /// Estimated capacity for a bin of the given diameter, applying the
    /// power law `intercept * diameter^slope`.
    #[must_use]
    pub fn capacity_at(&self, diameter: f64) -> f64 {
        self.intercept * diameter.powf(self.slope)
    }

    /// Capacity predicted by the fitted log-linear regression itself,
    /// `exp(slope * diameter + ln(intercept))`.
    ///
    /// This is the relation the reference points were fitted with; it is
    /// used to check fit quality, while estimates use [`Self::capacity_at`].
    #[must_use]
    pub fn fitted_capacity_at(&self, diameter: f64) -> f64 {
        self.intercept * (self.slope * diameter).exp()
    }
}

/// Fitted curves keyed by tier label.
pub type TierCurves = BTreeMap<String, TierCurve>;

/// The cheapest and most generous tiers offered at one diameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBracket {
    /// Tier used for the low capacity estimate.
    pub min_tier: String,
    /// Tier used for the high capacity estimate.
    pub max_tier: String,
}

/// Tier brackets keyed by reference diameter.
///
/// Lookups go through [`TierBrackets::nearest`], which replaces scanning
/// the whole table for every silo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierBrackets {
    by_diameter: BTreeMap<ReferenceDiameter, TierBracket>,
}

impl TierBrackets {
    /// Wraps an already-built map.
    #[must_use]
    pub const fn new(by_diameter: BTreeMap<ReferenceDiameter, TierBracket>) -> Self {
        Self { by_diameter }
    }

    /// Bracket at an exact reference diameter.
    #[must_use]
    pub fn get(&self, diameter: f64) -> Option<&TierBracket> {
        self.by_diameter.get(&ReferenceDiameter(diameter))
    }

    /// Iterates brackets in ascending diameter order.
    pub fn iter(&self) -> impl Iterator<Item = (ReferenceDiameter, &TierBracket)> {
        self.by_diameter.iter().map(|(d, b)| (*d, b))
    }

    /// Number of reference diameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_diameter.len()
    }

    /// Whether no reference diameters are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_diameter.is_empty()
    }

    /// Reference diameter closest to `diameter` and its bracket.
    ///
    /// When two reference diameters are equally close the smaller one
    /// wins. Returns `None` only when there are no brackets or the input
    /// is `NaN`.
    #[must_use]
    pub fn nearest(&self, diameter: f64) -> Option<(ReferenceDiameter, &TierBracket)> {
        if diameter.is_nan() {
            return None;
        }
        let key = ReferenceDiameter(diameter);
        let below = self.by_diameter.range(..=key).next_back();
        let above = self.by_diameter.range(key..).next();

        match (below, above) {
            (Some((lo, lo_bracket)), Some((hi, hi_bracket))) => {
                if (hi.0 - diameter) < (diameter - lo.0) {
                    Some((*hi, hi_bracket))
                } else {
                    Some((*lo, lo_bracket))
                }
            }
            (Some((d, bracket)), None) | (None, Some((d, bracket))) => Some((*d, bracket)),
            (None, None) => None,
        }
    }
}

/// How tier labels are compared when picking the smallest and largest
/// tier at a diameter.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TierOrdering {
    /// Plain string comparison: `"10" < "2"`.
    #[default]
    Lexical,
    /// Compare labels as numbers, falling back to string comparison when
    /// either label is not numeric.
    Numeric,
}

impl TierOrdering {
    /// Compares two tier labels under this ordering.
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexical => a.cmp(b),
            Self::Numeric => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
                _ => a.cmp(b),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket(min: &str, max: &str) -> TierBracket {
        TierBracket {
            min_tier: min.to_string(),
            max_tier: max.to_string(),
        }
    }

    fn brackets(diameters: &[f64]) -> TierBrackets {
        TierBrackets::new(
            diameters
                .iter()
                .map(|&d| (ReferenceDiameter(d), bracket("1", "2")))
                .collect(),
        )
    }

    #[test]
    fn nearest_picks_closest_diameter() {
        let lookup = brackets(&[4.0, 8.0, 12.0]);
        assert_eq!(lookup.nearest(7.0).unwrap().0.meters(), 8.0);
        assert_eq!(lookup.nearest(5.9).unwrap().0.meters(), 4.0);
        assert_eq!(lookup.nearest(11.0).unwrap().0.meters(), 12.0);
    }

    #[test]
    fn nearest_breaks_ties_toward_smaller_diameter() {
        let lookup = brackets(&[4.0, 8.0]);
        assert_eq!(lookup.nearest(6.0).unwrap().0.meters(), 4.0);
    }

    #[test]
    fn nearest_clamps_outside_the_table() {
        let lookup = brackets(&[4.0, 8.0]);
        assert_eq!(lookup.nearest(1.0).unwrap().0.meters(), 4.0);
        assert_eq!(lookup.nearest(30.0).unwrap().0.meters(), 8.0);
    }

    #[test]
    fn nearest_on_exact_match() {
        let lookup = brackets(&[4.0, 8.0]);
        assert_eq!(lookup.nearest(8.0).unwrap().0.meters(), 8.0);
    }

    #[test]
    fn nearest_on_empty_or_nan() {
        assert!(TierBrackets::default().nearest(5.0).is_none());
        assert!(brackets(&[4.0]).nearest(f64::NAN).is_none());
    }

    #[test]
    fn lexical_ordering_compares_strings() {
        assert_eq!(TierOrdering::Lexical.compare("10", "2"), Ordering::Less);
    }

    #[test]
    fn numeric_ordering_compares_numbers() {
        assert_eq!(TierOrdering::Numeric.compare("10", "2"), Ordering::Greater);
        assert_eq!(TierOrdering::Numeric.compare("a", "b"), Ordering::Less);
    }

    #[test]
    fn tier_ordering_parses_from_config_strings() {
        assert_eq!(
            "numeric".parse::<TierOrdering>().unwrap(),
            TierOrdering::Numeric
        );
        assert_eq!(TierOrdering::Lexical.to_string(), "lexical");
    }

    #[test]
    fn power_law_grows_with_diameter() {
        let curve = TierCurve {
            slope: 0.5,
            intercept: 12.0,
        };
        let mut previous = 0.0;
        for d in [4.0, 5.0, 8.0, 12.5, 20.0] {
            let capacity = curve.capacity_at(d);
            assert!(capacity > previous, "{capacity} <= {previous} at {d}");
            previous = capacity;
        }
    }
}

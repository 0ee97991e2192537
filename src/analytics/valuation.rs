//! Inventory valuation: per-location rollups plus the unassigned bucket

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use crate::analytics::depreciation::DepreciationPolicy;
use crate::core::store::Snapshot;
use crate::engine::{LocationTotals, LocationTree, Rollup};
use crate::entities::Item;

/// Totals for every location in a snapshot, as of one date
#[derive(Debug, Clone)]
pub struct Valuation {
    pub as_of: NaiveDate,
    rollup: Rollup<LocationTotals>,
    /// Item ID -> depreciated value
    item_values: HashMap<String, f64>,
    /// Items with no location or a location that does not exist
    pub unassigned: LocationTotals,
    pub unassigned_items: BTreeSet<String>,
}

impl Valuation {
    pub fn compute(snapshot: &Snapshot, policy: &DepreciationPolicy, as_of: NaiveDate) -> Self {
        let tree = LocationTree::build(&snapshot.locations);

        let mut item_values = HashMap::with_capacity(snapshot.items.len());
        let mut direct: HashMap<&str, LocationTotals> = HashMap::new();
        let mut unassigned = LocationTotals::default();
        let mut unassigned_items = BTreeSet::new();

        for item in &snapshot.items {
            let depreciated = policy.current_value(item, as_of);
            item_values.insert(item.id.to_string(), depreciated);

            let totals = LocationTotals {
                item_count: 1,
                value: item.value_or_zero(),
                depreciated_value: depreciated,
            };

            match item.location_id().filter(|loc| tree.contains(loc)) {
                Some(loc) => {
                    let entry = direct.entry(loc).or_default();
                    *entry = *entry + totals;
                }
                None => {
                    unassigned = unassigned + totals;
                    unassigned_items.insert(item.id.to_string());
                }
            }
        }

        let rollup = Rollup::compute(&tree, |id| direct.get(id).copied().unwrap_or_default());

        Self {
            as_of,
            rollup,
            item_values,
            unassigned,
            unassigned_items,
        }
    }

    /// Totals of the items stored directly at a location
    pub fn direct(&self, location_id: &str) -> LocationTotals {
        self.rollup.direct(location_id)
    }

    /// Totals of a location and everything below it
    pub fn aggregate(&self, location_id: &str) -> LocationTotals {
        self.rollup.aggregate(location_id)
    }

    /// Depreciated value of one item
    pub fn item_value(&self, item: &Item) -> f64 {
        self.item_values
            .get(item.id.as_str())
            .copied()
            .unwrap_or_else(|| item.value_or_zero())
    }

    pub fn cycle_members(&self) -> &BTreeSet<String> {
        self.rollup.cycle_members()
    }

    pub fn is_cycle_member(&self, location_id: &str) -> bool {
        self.rollup.is_cycle_member(location_id)
    }

    /// Every item counted once, assigned or not
    pub fn grand_total(&self) -> LocationTotals {
        self.rollup.grand_total() + self.unassigned
    }

    /// The underlying location rollup
    pub fn rollup(&self) -> &Rollup<LocationTotals> {
        &self.rollup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Location;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn item(name: &str, location: Option<&Location>, value: Option<f64>) -> Item {
        let mut item = Item::new(name.into(), location.map(|l| l.id.to_string()), "t".into());
        item.value = value;
        item
    }

    #[test]
    fn test_rollup_and_unassigned_bucket() {
        let house = Location::new("House".into(), None, "t".into());
        let kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());

        let mut ghost = item("Ghost", None, Some(5.0));
        ghost.location = Some("LOC-DELETED".into());

        let snapshot = Snapshot {
            locations: vec![house.clone(), kitchen.clone()],
            items: vec![
                item("Sofa", Some(&house), Some(800.0)),
                item("Kettle", Some(&kitchen), Some(40.0)),
                item("Mug", Some(&kitchen), None),
                item("Box", None, Some(10.0)),
                ghost,
            ],
            issues: Vec::new(),
        };

        let valuation = Valuation::compute(&snapshot, &DepreciationPolicy::default(), date());

        assert_eq!(valuation.direct(kitchen.id.as_str()).item_count, 2);
        assert_eq!(valuation.direct(kitchen.id.as_str()).value, 40.0);

        let house_total = valuation.aggregate(house.id.as_str());
        assert_eq!(house_total.item_count, 3);
        assert_eq!(house_total.value, 840.0);
        assert_eq!(house_total.depreciated_value, 840.0);

        assert_eq!(valuation.unassigned.item_count, 2);
        assert_eq!(valuation.unassigned.value, 15.0);
        assert_eq!(valuation.unassigned_items.len(), 2);

        assert_eq!(valuation.grand_total().item_count, 5);
        assert_eq!(valuation.grand_total().value, 855.0);
    }

    #[test]
    fn test_cycle_members_are_reported() {
        let mut a = Location::new("A".into(), None, "t".into());
        let b = Location::new("B".into(), Some(a.id.to_string()), "t".into());
        a.parent = Some(b.id.to_string());

        let snapshot = Snapshot {
            locations: vec![a.clone(), b.clone()],
            items: vec![item("x", Some(&a), Some(1.0)), item("y", Some(&b), Some(2.0))],
            issues: Vec::new(),
        };

        let valuation = Valuation::compute(&snapshot, &DepreciationPolicy::default(), date());
        assert!(valuation.is_cycle_member(a.id.as_str()));
        assert!(valuation.is_cycle_member(b.id.as_str()));
        assert_eq!(valuation.aggregate(a.id.as_str()).value, 1.0);
        assert_eq!(valuation.aggregate(b.id.as_str()).value, 2.0);
        assert_eq!(valuation.grand_total().value, 3.0);
    }

    #[test]
    fn test_depreciated_values_roll_up() {
        let shed = Location::new("Shed".into(), None, "t".into());
        let mut mower = item("Mower", Some(&shed), Some(400.0));
        mower.depreciated_value = Some(150.0);

        let snapshot = Snapshot {
            locations: vec![shed.clone()],
            items: vec![mower.clone()],
            issues: Vec::new(),
        };

        let valuation = Valuation::compute(&snapshot, &DepreciationPolicy::default(), date());
        assert_eq!(valuation.item_value(&mower), 150.0);
        assert_eq!(valuation.aggregate(shed.id.as_str()).depreciated_value, 150.0);
        assert_eq!(valuation.aggregate(shed.id.as_str()).value, 400.0);
    }
}

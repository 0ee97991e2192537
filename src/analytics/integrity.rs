//! Structural checks over a whole snapshot
//!
//! The engine tolerates every kind of broken hierarchy; this module names
//! what it tolerated so `validate` and `status` can report it.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::core::store::Snapshot;
use crate::engine::{LocationTree, Rollup};

/// Hierarchy problems found in a snapshot
#[derive(Debug, Default, Clone, Serialize)]
pub struct IntegrityReport {
    /// Locations whose parent chain loops back to themselves
    pub cycle_members: BTreeSet<String>,
    /// Locations not reachable from any top-level location and not on a cycle
    pub unreachable: Vec<String>,
    /// (location, missing parent) pairs
    pub dangling_parents: Vec<(String, String)>,
    /// IDs used by more than one record
    pub duplicate_ids: Vec<String>,
    /// (item, missing location) pairs
    pub missing_item_locations: Vec<(String, String)>,
}

impl IntegrityReport {
    pub fn check(snapshot: &Snapshot) -> Self {
        let tree = LocationTree::build(&snapshot.locations);
        let cycle_members = Rollup::compute(&tree, |_| 0u64).cycle_members().clone();

        let reachable = tree.reachable();
        let unreachable = tree
            .iter()
            .map(|l| l.id.as_str())
            .filter(|id| !reachable.contains(id) && !cycle_members.contains(*id))
            .map(String::from)
            .collect();

        let dangling_parents = tree
            .dangling()
            .iter()
            .map(|l| (l.id.to_string(), l.parent.clone().unwrap_or_default()))
            .collect();

        let mut duplicate_ids: Vec<String> =
            tree.duplicates().iter().map(|l| l.id.to_string()).collect();
        let mut seen_items = HashSet::new();
        for item in &snapshot.items {
            if !seen_items.insert(item.id.as_str()) {
                duplicate_ids.push(item.id.to_string());
            }
        }
        duplicate_ids.sort();
        duplicate_ids.dedup();

        let missing_item_locations = snapshot
            .items
            .iter()
            .filter_map(|item| {
                let loc = item.location_id()?;
                (!tree.contains(loc)).then(|| (item.id.to_string(), loc.to_string()))
            })
            .collect();

        Self {
            cycle_members,
            unreachable,
            dangling_parents,
            duplicate_ids,
            missing_item_locations,
        }
    }

    /// Problems that make totals unreliable
    pub fn error_count(&self) -> usize {
        self.cycle_members.len() + self.duplicate_ids.len()
    }

    /// Problems that only hide records from the tree
    pub fn warning_count(&self) -> usize {
        self.unreachable.len() + self.dangling_parents.len() + self.missing_item_locations.len()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0 && self.warning_count() == 0
    }
}

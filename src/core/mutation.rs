//! Structural changes to the hierarchy
//!
//! Each operation checks the current snapshot before writing, so a move can
//! never close a parent loop through the CLI. Loops already present on disk
//! are left alone and reported by `validate`.

use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::store::{InventoryStore, Snapshot, StoreError};
use crate::engine::{descendants_of, LocationTree};
use crate::entities::{Item, Location};

/// Errors from hierarchy changes
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("cannot move '{location}' under '{target}': it is the location itself or one of its descendants")]
    WouldCreateCycle { location: String, target: String },

    #[error("'{name}' has {count} child location(s); use --recursive to delete them too")]
    HasChildren { name: String, count: usize },

    #[error("location name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a location delete touched
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Deleted location IDs
    pub locations: Vec<String>,
    /// Item IDs that were moved to "unassigned"
    pub unassigned_items: Vec<String>,
}

/// Change a location's display name
pub fn rename_location<S: InventoryStore + ?Sized>(
    store: &S,
    location: &Location,
    name: &str,
) -> Result<Location, MutationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MutationError::EmptyName);
    }

    let mut updated = location.clone();
    updated.name = name.to_string();
    updated.touch();
    store.save_location(&updated)?;
    tracing::debug!(id = %updated.id, name, "renamed location");
    Ok(updated)
}

/// Move a location under `new_parent`, or to the top level with `None`
///
/// Rejects a target that is the location itself or anywhere below it.
pub fn reparent_location<S: InventoryStore + ?Sized>(
    store: &S,
    snapshot: &Snapshot,
    location: &Location,
    new_parent: Option<&Location>,
) -> Result<Location, MutationError> {
    if let Some(target) = new_parent {
        let tree = LocationTree::build(&snapshot.locations);
        let below = descendants_of(&tree, location.id.as_str());
        if target.id == location.id || below.contains(target.id.as_str()) {
            return Err(MutationError::WouldCreateCycle {
                location: location.name.clone(),
                target: target.name.clone(),
            });
        }
    }

    let mut updated = location.clone();
    updated.parent = new_parent.map(|p| p.id.to_string());
    updated.touch();
    store.save_location(&updated)?;
    tracing::debug!(id = %updated.id, parent = ?updated.parent, "moved location");
    Ok(updated)
}

/// Delete a location
///
/// With children present this fails unless `recursive` is set, in which
/// case the whole subtree goes. Items stored anywhere in the deleted subtree
/// become unassigned rather than being deleted.
pub fn delete_location<S: InventoryStore + ?Sized>(
    store: &S,
    snapshot: &Snapshot,
    location: &Location,
    recursive: bool,
) -> Result<DeleteReport, MutationError> {
    let tree = LocationTree::build(&snapshot.locations);
    let children = tree.children_of(Some(location.id.as_str()));
    let child_count = children.iter().filter(|c| c.id != location.id).count();

    if child_count > 0 && !recursive {
        return Err(MutationError::HasChildren {
            name: location.name.clone(),
            count: child_count,
        });
    }

    let doomed = descendants_of(&tree, location.id.as_str());
    let mut report = DeleteReport::default();

    for item in snapshot
        .items
        .iter()
        .filter(|i| i.location_id().is_some_and(|loc| doomed.contains(loc)))
    {
        let mut updated = item.clone();
        updated.location = None;
        updated.touch();
        store.save_item(&updated)?;
        report.unassigned_items.push(updated.id.to_string());
    }

    // Leaves first so a failure part-way never leaves a dangling child behind
    let mut order: Vec<&Location> = tree
        .iter()
        .filter(|l| doomed.contains(l.id.as_str()))
        .collect();
    order.sort_by_key(|l| {
        std::cmp::Reverse(crate::engine::ancestors_of(&tree, l.id.as_str()).len())
    });

    for doomed_location in order {
        store.delete_location(&doomed_location.id)?;
        report.locations.push(doomed_location.id.to_string());
    }

    tracing::debug!(
        locations = report.locations.len(),
        unassigned = report.unassigned_items.len(),
        "deleted location subtree"
    );
    Ok(report)
}

/// Store an item at `location`, or unassign it with `None`
pub fn move_item<S: InventoryStore + ?Sized>(
    store: &S,
    item: &Item,
    location: Option<&Location>,
) -> Result<Item, MutationError> {
    let mut updated = item.clone();
    updated.location = location.map(|l| l.id.to_string());
    updated.touch();
    store.save_item(&updated)?;
    tracing::debug!(id = %updated.id, location = ?updated.location, "moved item");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use crate::core::store::YamlStore;
    use tempfile::tempdir;

    struct Fixture {
        _tmp: tempfile::TempDir,
        store: YamlStore,
        house: Location,
        kitchen: Location,
        pantry: Location,
        garage: Location,
    }

    fn fixture() -> Fixture {
        let tmp = tempdir().unwrap();
        let store = YamlStore::new(Project::init(tmp.path()).unwrap()).unwrap();

        let house = Location::new("House".into(), None, "t".into());
        let kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());
        let pantry = Location::new("Pantry".into(), Some(kitchen.id.to_string()), "t".into());
        let garage = Location::new("Garage".into(), None, "t".into());
        for loc in [&house, &kitchen, &pantry, &garage] {
            store.create_location(loc).unwrap();
        }

        Fixture {
            _tmp: tmp,
            store,
            house,
            kitchen,
            pantry,
            garage,
        }
    }

    #[test]
    fn test_reparent_rejects_descendant_target() {
        let f = fixture();
        let snap = f.store.snapshot().unwrap();

        let err = reparent_location(&f.store, &snap, &f.house, Some(&f.pantry)).unwrap_err();
        assert!(matches!(err, MutationError::WouldCreateCycle { .. }));

        let err = reparent_location(&f.store, &snap, &f.kitchen, Some(&f.kitchen)).unwrap_err();
        assert!(matches!(err, MutationError::WouldCreateCycle { .. }));
    }

    #[test]
    fn test_reparent_to_other_branch_and_root() {
        let f = fixture();
        let snap = f.store.snapshot().unwrap();

        let moved = reparent_location(&f.store, &snap, &f.kitchen, Some(&f.garage)).unwrap();
        assert_eq!(moved.parent.as_deref(), Some(f.garage.id.as_str()));

        let snap = f.store.snapshot().unwrap();
        let top = reparent_location(&f.store, &snap, &f.pantry, None).unwrap();
        assert!(top.is_root());
        assert_eq!(top.entity_revision, 2);
    }

    #[test]
    fn test_delete_with_children_requires_recursive() {
        let f = fixture();
        let snap = f.store.snapshot().unwrap();

        let err = delete_location(&f.store, &snap, &f.kitchen, false).unwrap_err();
        assert!(matches!(err, MutationError::HasChildren { count: 1, .. }));

        let report = delete_location(&f.store, &snap, &f.garage, false).unwrap();
        assert_eq!(report.locations, vec![f.garage.id.to_string()]);
    }

    #[test]
    fn test_recursive_delete_unassigns_items() {
        let f = fixture();
        let jam = Item::new("Jam".into(), Some(f.pantry.id.to_string()), "t".into());
        let car = Item::new("Car".into(), Some(f.garage.id.to_string()), "t".into());
        f.store.create_item(&jam).unwrap();
        f.store.create_item(&car).unwrap();

        let snap = f.store.snapshot().unwrap();
        let report = delete_location(&f.store, &snap, &f.kitchen, true).unwrap();
        assert_eq!(report.locations.len(), 2);
        assert_eq!(report.unassigned_items, vec![jam.id.to_string()]);

        let after = f.store.snapshot().unwrap();
        assert_eq!(after.locations.len(), 2);
        let jam_after = after.resolve_item(jam.id.as_str()).unwrap();
        assert!(jam_after.is_unassigned());
        let car_after = after.resolve_item(car.id.as_str()).unwrap();
        assert_eq!(car_after.location_id(), Some(f.garage.id.as_str()));
    }

    #[test]
    fn test_rename_and_move_item() {
        let f = fixture();
        assert!(matches!(
            rename_location(&f.store, &f.garage, "  "),
            Err(MutationError::EmptyName)
        ));
        let renamed = rename_location(&f.store, &f.garage, "Carport").unwrap();
        assert_eq!(renamed.name, "Carport");

        let bike = Item::new("Bike".into(), None, "t".into());
        f.store.create_item(&bike).unwrap();
        let moved = move_item(&f.store, &bike, Some(&f.garage)).unwrap();
        assert_eq!(moved.location_id(), Some(f.garage.id.as_str()));
        let back = move_item(&f.store, &moved, None).unwrap();
        assert!(back.is_unassigned());
    }
}

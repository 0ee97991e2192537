//! Record storage - the single source of location and item snapshots
//!
//! Commands never read record files themselves. They receive an
//! [`InventoryStore`] built once in `main` and ask it for a [`Snapshot`],
//! which the hierarchy engine then works on without further I/O.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::entities::{Item, Location};
use crate::schema::template::{TemplateError, TemplateGenerator};
use crate::yaml::{parse_yaml_file, YamlError};

/// A record file that could not be loaded
#[derive(Debug, Clone)]
pub struct LoadIssue {
    pub path: PathBuf,
    pub kind: EntityPrefix,
    pub message: String,
}

/// Every location and item at one point in time
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub locations: Vec<Location>,
    pub items: Vec<Item>,
    /// Files skipped while loading
    pub issues: Vec<LoadIssue>,
}

/// What kind of record a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Location,
    Item,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Location => write!(f, "location"),
            RecordKind::Item => write!(f, "item"),
        }
    }
}

/// Errors from reading or writing records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {id}: {message}")]
    Serialize { id: String, message: String },

    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("no {kind} matches '{reference}'")]
    NotFound { kind: RecordKind, reference: String },

    #[error("'{reference}' matches {} {kind}s: {}", .candidates.len(), .candidates.join(", "))]
    Ambiguous {
        kind: RecordKind,
        reference: String,
        candidates: Vec<String>,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Source and sink of inventory records
pub trait InventoryStore {
    /// Load a consistent snapshot of every record
    fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Write a location, creating or replacing its record
    fn save_location(&self, location: &Location) -> Result<PathBuf, StoreError>;

    /// Write an item, creating or replacing its record
    fn save_item(&self, item: &Item) -> Result<PathBuf, StoreError>;

    /// Write a brand-new location
    fn create_location(&self, location: &Location) -> Result<PathBuf, StoreError> {
        self.save_location(location)
    }

    /// Write a brand-new item
    fn create_item(&self, item: &Item) -> Result<PathBuf, StoreError> {
        self.save_item(item)
    }

    fn delete_location(&self, id: &EntityId) -> Result<(), StoreError>;

    fn delete_item(&self, id: &EntityId) -> Result<(), StoreError>;

    /// Load one location by exact ID
    fn find_location(&self, id: &EntityId) -> Result<Option<(PathBuf, Location)>, StoreError>;

    /// Load one item by exact ID
    fn find_item(&self, id: &EntityId) -> Result<Option<(PathBuf, Item)>, StoreError>;
}

/// Records stored as one YAML file each under the project directory
pub struct YamlStore {
    project: Project,
    templates: TemplateGenerator,
}

impl YamlStore {
    pub fn new(project: Project) -> Result<Self, StoreError> {
        Ok(Self {
            project,
            templates: TemplateGenerator::new()?,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn load_all<T: Entity>(&self, issues: &mut Vec<LoadIssue>) -> Vec<T> {
        let mut records = Vec::new();

        for path in self.project.iter_entity_files(T::PREFIX) {
            match parse_yaml_file::<T>(&path) {
                Ok(record) => {
                    let relative = self.project.relative(&path);
                    tracing::debug!(path = %relative.display(), "loaded record");
                    records.push(record);
                }
                Err(e) => {
                    let message = e.summary();
                    tracing::warn!(
                        path = %self.project.relative(&path).display(),
                        error = %message,
                        "skipping unreadable record"
                    );
                    issues.push(LoadIssue {
                        path,
                        kind: T::PREFIX,
                        message,
                    });
                }
            }
        }

        records
    }

    /// Where the record for `id` lives (or should live)
    ///
    /// Files may have been renamed by hand, so the canonical name is only a
    /// first guess; otherwise any file whose name contains the ID is used.
    fn locate_file(&self, id: &EntityId) -> PathBuf {
        let canonical = self.project.entity_path(id);
        if canonical.exists() {
            return canonical;
        }

        self.project
            .iter_entity_files(id.prefix())
            .find(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().contains(id.as_str()))
            })
            .unwrap_or(canonical)
    }

    fn write<T: Entity>(&self, record: &T) -> Result<PathBuf, StoreError> {
        let yaml = serde_yml::to_string(record).map_err(|e| StoreError::Serialize {
            id: record.id().to_string(),
            message: e.to_string(),
        })?;
        let path = self.locate_file(record.id());
        self.write_text(&path, &yaml)?;
        Ok(path)
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| StoreError::io(path, e))?;
        tracing::debug!(path = %self.project.relative(path).display(), "wrote record");
        Ok(())
    }

    fn remove(&self, id: &EntityId) -> Result<(), StoreError> {
        let path = self.locate_file(id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind: kind_of(id),
                reference: id.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!(path = %self.project.relative(&path).display(), "deleted record");
        Ok(())
    }

    fn find<T: Entity>(&self, id: &EntityId) -> Result<Option<(PathBuf, T)>, StoreError> {
        let path = self.locate_file(id);
        if !path.exists() {
            return Ok(None);
        }
        let record = parse_yaml_file::<T>(&path)?;
        Ok(Some((path, record)))
    }
}

fn kind_of(id: &EntityId) -> RecordKind {
    match id.prefix() {
        EntityPrefix::Loc => RecordKind::Location,
        EntityPrefix::Item => RecordKind::Item,
    }
}

impl InventoryStore for YamlStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let mut issues = Vec::new();
        let locations = self.load_all::<Location>(&mut issues);
        let items = self.load_all::<Item>(&mut issues);

        tracing::debug!(
            locations = locations.len(),
            items = items.len(),
            issues = issues.len(),
            "loaded snapshot"
        );

        Ok(Snapshot {
            locations,
            items,
            issues,
        })
    }

    fn save_location(&self, location: &Location) -> Result<PathBuf, StoreError> {
        self.write(location)
    }

    fn save_item(&self, item: &Item) -> Result<PathBuf, StoreError> {
        self.write(item)
    }

    fn create_location(&self, location: &Location) -> Result<PathBuf, StoreError> {
        let yaml = self.templates.render_location(location)?;
        let path = self.project.entity_path(&location.id);
        self.write_text(&path, &yaml)?;
        Ok(path)
    }

    fn create_item(&self, item: &Item) -> Result<PathBuf, StoreError> {
        let yaml = self.templates.render_item(item)?;
        let path = self.project.entity_path(&item.id);
        self.write_text(&path, &yaml)?;
        Ok(path)
    }

    fn delete_location(&self, id: &EntityId) -> Result<(), StoreError> {
        self.remove(id)
    }

    fn delete_item(&self, id: &EntityId) -> Result<(), StoreError> {
        self.remove(id)
    }

    fn find_location(&self, id: &EntityId) -> Result<Option<(PathBuf, Location)>, StoreError> {
        self.find(id)
    }

    fn find_item(&self, id: &EntityId) -> Result<Option<(PathBuf, Item)>, StoreError> {
        self.find(id)
    }
}

impl Snapshot {
    /// Resolve a location by full ID, unique ID prefix, exact name or
    /// `/`-separated name path (e.g. `House/Kitchen/Pantry`)
    pub fn resolve_location(&self, reference: &str) -> Result<&Location, StoreError> {
        let reference = reference.trim();

        if let Some(found) = self
            .locations
            .iter()
            .find(|l| l.id.as_str().eq_ignore_ascii_case(reference))
        {
            return Ok(found);
        }

        let by_prefix = matching_prefix(&self.locations, reference);
        if !by_prefix.is_empty() {
            return pick_one(by_prefix, RecordKind::Location, reference);
        }

        let by_name: Vec<&Location> = self
            .locations
            .iter()
            .filter(|l| l.name.trim().eq_ignore_ascii_case(reference))
            .collect();
        if !by_name.is_empty() {
            return pick_one(by_name, RecordKind::Location, reference);
        }

        if reference.contains('/') {
            let by_path = self.locations_by_path(reference);
            if !by_path.is_empty() {
                return pick_one(by_path, RecordKind::Location, reference);
            }
        }

        Err(StoreError::NotFound {
            kind: RecordKind::Location,
            reference: reference.to_string(),
        })
    }

    /// Resolve an item by full ID, unique ID prefix or exact name
    pub fn resolve_item(&self, reference: &str) -> Result<&Item, StoreError> {
        let reference = reference.trim();

        if let Some(found) = self
            .items
            .iter()
            .find(|i| i.id.as_str().eq_ignore_ascii_case(reference))
        {
            return Ok(found);
        }

        let by_prefix = matching_prefix(&self.items, reference);
        if !by_prefix.is_empty() {
            return pick_one(by_prefix, RecordKind::Item, reference);
        }

        let by_name: Vec<&Item> = self
            .items
            .iter()
            .filter(|i| i.name.trim().eq_ignore_ascii_case(reference))
            .collect();
        if !by_name.is_empty() {
            return pick_one(by_name, RecordKind::Item, reference);
        }

        Err(StoreError::NotFound {
            kind: RecordKind::Item,
            reference: reference.to_string(),
        })
    }

    /// Locations whose name chain from the top matches every path segment
    fn locations_by_path(&self, path: &str) -> Vec<&Location> {
        let segments: Vec<String> = path
            .split('/')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let Some(last) = segments.last() else {
            return Vec::new();
        };

        let by_id = |id: &str| self.locations.iter().find(|l| l.id.as_str() == id);

        self.locations
            .iter()
            .filter(|l| l.name.trim().to_lowercase() == *last)
            .filter(|candidate| {
                let mut current = Some(*candidate);
                for segment in segments.iter().rev() {
                    match current {
                        Some(loc) if loc.name.trim().to_lowercase() == *segment => {
                            current = loc.parent.as_deref().and_then(by_id);
                        }
                        _ => return false,
                    }
                }
                // The chain must start at a top-level location
                current.is_none()
            })
            .collect()
    }
}

/// Records whose ID starts with `reference` (at least one character past the prefix dash)
fn matching_prefix<'a, T: Entity>(records: &'a [T], reference: &str) -> Vec<&'a T> {
    let wanted = reference.to_uppercase();
    let min_len = T::PREFIX.as_str().len() + 2;
    if wanted.len() < min_len || !wanted.starts_with(&format!("{}-", T::PREFIX.as_str())) {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| r.id().as_str().to_uppercase().starts_with(&wanted))
        .collect()
}

fn pick_one<'a, T: Entity>(
    mut matches: Vec<&'a T>,
    kind: RecordKind,
    reference: &str,
) -> Result<&'a T, StoreError> {
    if matches.len() == 1 {
        return Ok(matches.remove(0));
    }

    Err(StoreError::Ambiguous {
        kind,
        reference: reference.to_string(),
        candidates: matches
            .iter()
            .map(|r| format!("{} ({})", r.id(), r.name()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, YamlStore) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        (tmp, YamlStore::new(project).unwrap())
    }

    #[test]
    fn test_create_and_snapshot() {
        let (_tmp, store) = store();
        let house = Location::new("House".into(), None, "t".into());
        let mut kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());
        kitchen.sort_order = Some(2);
        let mut toaster = Item::new("Toaster".into(), Some(kitchen.id.to_string()), "t".into());
        toaster.value = Some(39.5);

        store.create_location(&house).unwrap();
        store.create_location(&kitchen).unwrap();
        store.create_item(&toaster).unwrap();

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.locations.len(), 2);
        assert_eq!(snap.items.len(), 1);
        assert!(snap.issues.is_empty());

        let loaded = snap.resolve_location(kitchen.id.as_str()).unwrap();
        assert_eq!(loaded.parent.as_deref(), Some(house.id.as_str()));
        assert_eq!(loaded.sort_order, Some(2));
        assert_eq!(snap.items[0].value, Some(39.5));
    }

    #[test]
    fn test_bad_file_becomes_issue() {
        let (_tmp, store) = store();
        store
            .create_location(&Location::new("Garage".into(), None, "t".into()))
            .unwrap();
        let bad = store.project().root().join("locations/LOC-BROKEN.pinv.yaml");
        std::fs::write(&bad, "id: [unclosed\n").unwrap();

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.locations.len(), 1);
        assert_eq!(snap.issues.len(), 1);
        assert_eq!(snap.issues[0].kind, EntityPrefix::Loc);
    }

    #[test]
    fn test_save_find_delete() {
        let (_tmp, store) = store();
        let mut shed = Location::new("Shed".into(), None, "t".into());
        store.create_location(&shed).unwrap();

        shed.name = "Tool Shed".into();
        shed.touch();
        store.save_location(&shed).unwrap();

        let (_, found) = store.find_location(&shed.id).unwrap().unwrap();
        assert_eq!(found.name, "Tool Shed");
        assert_eq!(found.entity_revision, 2);

        store.delete_location(&shed.id).unwrap();
        assert!(store.find_location(&shed.id).unwrap().is_none());
        assert!(matches!(
            store.delete_location(&shed.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_location_by_name_prefix_and_path() {
        let house = Location::new("House".into(), None, "t".into());
        let kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());
        let cabin = Location::new("Cabin".into(), None, "t".into());
        let cabin_kitchen = Location::new("Kitchen".into(), Some(cabin.id.to_string()), "t".into());
        let snap = Snapshot {
            locations: vec![house.clone(), kitchen.clone(), cabin, cabin_kitchen],
            ..Default::default()
        };

        assert_eq!(snap.resolve_location("house").unwrap().id, house.id);
        assert_eq!(snap.resolve_location(&house.id.as_str()[..20]).unwrap().id, house.id);
        assert!(matches!(
            snap.resolve_location("Kitchen"),
            Err(StoreError::Ambiguous { .. })
        ));
        assert_eq!(snap.resolve_location("House / Kitchen").unwrap().id, kitchen.id);
        assert!(matches!(
            snap.resolve_location("Garage"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_item_by_name() {
        let lamp = Item::new("Lamp".into(), None, "t".into());
        let snap = Snapshot {
            items: vec![lamp.clone()],
            ..Default::default()
        };
        assert_eq!(snap.resolve_item("LAMP").unwrap().id, lamp.id);
        assert!(snap.resolve_item("Desk").is_err());
    }
}

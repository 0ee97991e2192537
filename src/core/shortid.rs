//! Short ID system for easier record selection
//!
//! Listings assign numeric aliases per record type: locations become
//! `LOC@1`, `LOC@2`, ... and items `ITEM@1`, .... A bare `@N` is resolved
//! against whichever type the command expects. The aliases are rewritten by
//! every listing and stored in `.pinv/shortids.json` so the next command can
//! use them.

use std::collections::BTreeMap;
use std::fs;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;

/// Index file name within the marker directory
const INDEX_FILE: &str = "shortids.json";

/// Per-type mapping of short numbers to full IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Prefix -> full IDs; the short number is the position plus one
    entries: BTreeMap<String, Vec<String>>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a project, or start empty if missing or unreadable
    pub fn load(project: &Project) -> Self {
        let path = project.pinv_dir().join(INDEX_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "discarding unreadable short id index");
            Self::new()
        })
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.pinv_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Replace the aliases of one record type, numbering from 1 in the given order
    pub fn rebuild(&mut self, prefix: EntityPrefix, ids: impl IntoIterator<Item = String>) {
        let mut list: Vec<String> = Vec::new();
        for id in ids {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        self.entries.insert(prefix.as_str().to_string(), list);
    }

    /// Give a newly created record the next alias of its type
    pub fn add(&mut self, id: &EntityId) -> usize {
        let list = self
            .entries
            .entry(id.prefix().as_str().to_string())
            .or_default();
        match list.iter().position(|existing| existing == id.as_str()) {
            Some(i) => i + 1,
            None => {
                list.push(id.to_string());
                list.len()
            }
        }
    }

    /// Resolve `@N` or `PREFIX@N`; anything else is returned unchanged
    ///
    /// Returns `None` only for a short reference that has no entry.
    pub fn resolve(&self, reference: &str, expected: EntityPrefix) -> Option<String> {
        let Some((prefix, number)) = reference.split_once('@') else {
            return Some(reference.to_string());
        };

        let prefix = if prefix.is_empty() {
            expected
        } else {
            prefix.parse().ok()?
        };

        let n: usize = number.parse().ok()?;
        self.entries
            .get(prefix.as_str())
            .and_then(|list| list.get(n.checked_sub(1)?))
            .cloned()
    }

    /// Short number for a full ID, if one is assigned
    pub fn get_short_id(&self, entity_id: &str) -> Option<usize> {
        let prefix = EntityPrefix::from_filename(entity_id)?;
        self.entries
            .get(prefix.as_str())?
            .iter()
            .position(|id| id == entity_id)
            .map(|i| i + 1)
    }

    /// `LOC@3`-style alias, or the full ID when none is assigned
    pub fn format(&self, entity_id: &EntityId) -> String {
        match self.get_short_id(entity_id.as_str()) {
            Some(n) => format!("{}@{}", entity_id.prefix(), n),
            None => entity_id.to_string(),
        }
    }

    /// Number of aliases across all types
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_rebuild_and_resolve() {
        let mut index = ShortIdIndex::new();
        index.rebuild(
            EntityPrefix::Loc,
            vec!["LOC-01A".to_string(), "LOC-02B".to_string()],
        );
        index.rebuild(EntityPrefix::Item, vec!["ITEM-01C".to_string()]);

        assert_eq!(index.resolve("@1", EntityPrefix::Loc), Some("LOC-01A".to_string()));
        assert_eq!(index.resolve("@1", EntityPrefix::Item), Some("ITEM-01C".to_string()));
        assert_eq!(index.resolve("LOC@2", EntityPrefix::Item), Some("LOC-02B".to_string()));
        assert_eq!(index.resolve("loc@2", EntityPrefix::Item), Some("LOC-02B".to_string()));
        assert_eq!(index.resolve("@9", EntityPrefix::Loc), None);
        assert_eq!(index.resolve("@0", EntityPrefix::Loc), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_plain_references_pass_through() {
        let index = ShortIdIndex::new();
        assert_eq!(
            index.resolve("LOC-01A", EntityPrefix::Loc),
            Some("LOC-01A".to_string())
        );
        assert_eq!(index.resolve("Kitchen", EntityPrefix::Loc), Some("Kitchen".to_string()));
    }

    #[test]
    fn test_rebuild_replaces_one_type_only() {
        let mut index = ShortIdIndex::new();
        index.rebuild(EntityPrefix::Loc, vec!["LOC-OLD".to_string()]);
        index.rebuild(EntityPrefix::Item, vec!["ITEM-KEEP".to_string()]);
        index.rebuild(EntityPrefix::Loc, vec!["LOC-NEW".to_string(), "LOC-NEW".to_string()]);

        assert_eq!(index.resolve("@1", EntityPrefix::Loc), Some("LOC-NEW".to_string()));
        assert_eq!(index.resolve("@2", EntityPrefix::Loc), None);
        assert_eq!(index.get_short_id("ITEM-KEEP"), Some(1));
        assert_eq!(index.get_short_id("LOC-OLD"), None);
    }

    #[test]
    fn test_add_appends_once() {
        let mut index = ShortIdIndex::new();
        index.rebuild(EntityPrefix::Loc, vec!["LOC-01A".to_string()]);

        let id = EntityId::new(EntityPrefix::Loc);
        assert_eq!(index.add(&id), 2);
        assert_eq!(index.add(&id), 2);
        assert_eq!(index.format(&id), "LOC@2");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut index = ShortIdIndex::new();
        index.rebuild(EntityPrefix::Loc, vec!["LOC-01A".to_string()]);
        index.save(&project).unwrap();

        let loaded = ShortIdIndex::load(&project);
        assert_eq!(loaded.resolve("LOC@1", EntityPrefix::Item), Some("LOC-01A".to_string()));
    }
}

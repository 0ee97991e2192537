//! Location entity type - a node in the property hierarchy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::entity::{default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::engine::TreeNode;

/// A place where items are kept: building, floor, room, cabinet, shelf, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: EntityId,

    /// Display name (not required to be unique)
    pub name: String,

    /// Parent location ID; absent for a top-level location
    ///
    /// Kept as a raw string so references to deleted or mistyped locations
    /// survive a load and can be reported instead of rejected.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,

    /// Position among siblings, lower first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this location)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

/// Treat `parent: ""` the same as a missing parent
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

impl Entity for Location {
    const PREFIX: EntityPrefix = EntityPrefix::Loc;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn touch(&mut self) {
        self.entity_revision += 1;
    }
}

impl TreeNode for Location {
    fn node_id(&self) -> &str {
        self.id.as_str()
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn sort_order(&self) -> Option<i64> {
        self.sort_order
    }
}

impl Location {
    /// Create a new location
    pub fn new(name: String, parent: Option<String>, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Loc),
            name,
            parent,
            sort_order: None,
            description: None,
            tags: Vec::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Whether this is a top-level location
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_creation() {
        let loc = Location::new("Kitchen".to_string(), None, "test".to_string());

        assert!(loc.id.to_string().starts_with("LOC-"));
        assert_eq!(loc.name, "Kitchen");
        assert!(loc.is_root());
        assert_eq!(loc.node_id(), loc.id.as_str());
        assert_eq!(loc.entity_revision, 1);
    }

    #[test]
    fn test_location_roundtrip() {
        let mut loc = Location::new(
            "Pantry".to_string(),
            Some("LOC-01HQ3K4N5M6P7R8S9T0VWXYZAB".to_string()),
            "test".to_string(),
        );
        loc.sort_order = Some(3);

        let yaml = serde_yml::to_string(&loc).unwrap();
        let parsed: Location = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, loc.id);
        assert_eq!(parsed.parent, loc.parent);
        assert_eq!(parsed.sort_order, Some(3));
    }

    #[test]
    fn test_blank_and_null_parent_mean_root() {
        let yaml = |parent: &str| {
            format!(
                "id: LOC-01HQ3K4N5M6P7R8S9T0VWXYZAB\nname: Attic\n{}created: 2024-01-01T00:00:00Z\nauthor: t\n",
                parent
            )
        };

        for parent in ["", "parent: \"\"\n", "parent: null\n", "parent: \"  \"\n"] {
            let loc: Location = serde_yml::from_str(&yaml(parent)).unwrap();
            assert!(loc.is_root(), "parent line {:?} should mean root", parent);
        }
    }

    #[test]
    fn test_dangling_parent_survives_load() {
        let yaml = "id: LOC-01HQ3K4N5M6P7R8S9T0VWXYZAB\nname: Shed\nparent: LOC-GONE\ncreated: 2024-01-01T00:00:00Z\nauthor: t\n";
        let loc: Location = serde_yml::from_str(yaml).unwrap();
        assert_eq!(loc.parent_id(), Some("LOC-GONE"));
    }

    #[test]
    fn test_entity_trait_implementation() {
        let mut loc = Location::new("Garage".to_string(), None, "test_author".to_string());
        assert_eq!(Location::PREFIX, EntityPrefix::Loc);
        assert_eq!(Entity::name(&loc), "Garage");
        assert_eq!(loc.author(), "test_author");

        loc.touch();
        assert_eq!(loc.entity_revision, 2);
    }
}

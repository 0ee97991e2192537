//! Record identity using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Record type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Location (building, room, shelf, ...)
    Loc,
    /// Item stored at a location
    Item,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Loc => "LOC",
            EntityPrefix::Item => "ITEM",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[EntityPrefix::Loc, EntityPrefix::Item]
    }

    /// Directory (relative to the project root) holding records of this type
    pub fn directory(&self) -> &'static str {
        match self {
            EntityPrefix::Loc => "locations",
            EntityPrefix::Item => "items",
        }
    }

    /// Human-readable singular name
    pub fn noun(&self) -> &'static str {
        match self {
            EntityPrefix::Loc => "location",
            EntityPrefix::Item => "item",
        }
    }

    /// Try to determine the prefix from a filename like "LOC-xxx.pinv.yaml"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|p| upper.starts_with(&format!("{}-", p.as_str())))
    }

    /// Try to determine the prefix from a path, falling back to its directory
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        if let Some(prefix) = path
            .file_name()
            .and_then(|f| Self::from_filename(&f.to_string_lossy()))
        {
            return Some(prefix);
        }

        path.components().find_map(|component| match component {
            std::path::Component::Normal(os_str) => {
                let dir = os_str.to_string_lossy().to_lowercase();
                Self::all().iter().copied().find(|p| p.directory() == dir)
            }
            _ => None,
        })
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOC" => Ok(EntityPrefix::Loc),
            "ITEM" => Ok(EntityPrefix::Item),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique record identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
    /// Rendered form, kept so the ID can be borrowed as `&str`
    text: String,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self::from_parts(prefix, Ulid::new())
    }

    fn from_parts(prefix: EntityPrefix, ulid: Ulid) -> Self {
        Self {
            prefix,
            ulid,
            text: format!("{}-{}", prefix, ulid),
        }
    }

    /// Get the record prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// The full ID, e.g. `LOC-01HQ3K4N5M6P7R8S9T0VWXYZAB`
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self::from_parts(prefix, ulid))
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing record IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record prefix: '{0}' (valid: LOC, ITEM)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in record ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Loc);
        assert!(id.to_string().starts_with("LOC-"));
        assert_eq!(id.to_string().len(), 30); // LOC- (4) + ULID (26) = 30
    }

    #[test]
    fn test_entity_id_parsing() {
        let original = EntityId::new(EntityPrefix::Item);
        let parsed = EntityId::parse(&original.to_string()).unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Item);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = EntityId::parse("XXX-01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = EntityId::parse("LOC01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = EntityId::parse("ITEM-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_prefix_from_path() {
        use std::path::Path;
        assert_eq!(
            EntityPrefix::from_path(Path::new("items/ITEM-01ABC.pinv.yaml")),
            Some(EntityPrefix::Item)
        );
        assert_eq!(
            EntityPrefix::from_path(Path::new("locations/renamed.pinv.yaml")),
            Some(EntityPrefix::Loc)
        );
        assert_eq!(EntityPrefix::from_path(Path::new("notes/readme.md")), None);
    }
}

//! Embedded JSON Schemas for record files

use rust_embed::Embed;
use std::collections::HashMap;

use crate::core::identity::EntityPrefix;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// JSON Schema text per record type
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<EntityPrefix, String>,
}

impl SchemaRegistry {
    /// File name of the schema for a record type
    pub fn file_name(prefix: EntityPrefix) -> String {
        format!("{}.schema.json", prefix.noun())
    }

    /// Schema source for a record type
    pub fn get(&self, prefix: EntityPrefix) -> Option<&str> {
        self.schemas.get(&prefix).map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut schemas = HashMap::new();

        for prefix in EntityPrefix::all() {
            let name = Self::file_name(*prefix);
            match EmbeddedSchemas::get(&name)
                .and_then(|file| String::from_utf8(file.data.into_owned()).ok())
            {
                Some(text) => {
                    schemas.insert(*prefix, text);
                }
                None => tracing::warn!(schema = %name, "embedded schema missing"),
            }
        }

        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_schemas_embedded_and_parse() {
        let registry = SchemaRegistry::default();
        for prefix in EntityPrefix::all() {
            let text = registry.get(*prefix).expect("schema embedded");
            let json: serde_json::Value = serde_json::from_str(text).unwrap();
            assert_eq!(json["type"], "object");
        }
    }
}

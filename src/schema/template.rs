//! Template rendering for new record files
//!
//! New records are written from commented templates so a hand-edited file
//! shows which optional fields exist. Every rendered template must read back
//! as the record it was rendered from.

use rust_embed::Embed;
use serde_json::json;
use tera::Tera;
use thiserror::Error;

use crate::entities::{Item, Location};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const LOCATION_TEMPLATE: &str = "location.yaml.tera";
const ITEM_TEMPLATE: &str = "item.yaml.tera";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template rendering error: {0}")]
    RenderError(String),
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

impl TemplateGenerator {
    /// Create a generator with the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    pub fn render_location(&self, location: &Location) -> Result<String, TemplateError> {
        let mut context = base_context(
            location.id.as_str(),
            &location.name,
            &location.author,
            location.created,
            location.entity_revision,
        );
        context.insert("parent", &location.parent);
        context.insert("sort_order", &location.sort_order);
        context.insert("description", &location.description);
        context.insert("tags", &location.tags);

        self.render(LOCATION_TEMPLATE, &context)
    }

    pub fn render_item(&self, item: &Item) -> Result<String, TemplateError> {
        let mut context = base_context(
            item.id.as_str(),
            &item.name,
            &item.author,
            item.created,
            item.entity_revision,
        );
        context.insert("location", &item.location);

        let text_fields = [
            ("category", &item.category),
            ("brand", &item.brand),
            ("model", &item.model),
            ("serial_number", &item.serial_number),
            ("notes", &item.notes),
        ]
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect::<Vec<_>>();
        context.insert("text_fields", &text_fields);

        context.insert("value", &item.value);
        context.insert("purchase_date", &item.purchase_date);
        context.insert("useful_life_years", &item.useful_life_years);
        context.insert("salvage_value", &item.salvage_value);
        context.insert("depreciated_value", &item.depreciated_value);
        context.insert("warranty_expires", &item.warranty_expires);
        context.insert("photos", &item.photos);
        context.insert("tags", &item.tags);
        context.insert("metadata", &item.metadata);

        self.render(ITEM_TEMPLATE, &context)
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

fn base_context(
    id: &str,
    name: &str,
    author: &str,
    created: chrono::DateTime<chrono::Utc>,
    revision: u32,
) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("id", id);
    context.insert("name", name);
    context.insert("heading", &single_line(name));
    context.insert("author", author);
    context.insert("heading_author", &single_line(author));
    context.insert("created", &created.to_rfc3339());
    context.insert("created_date", &created.format("%Y-%m-%d").to_string());
    context.insert("entity_revision", &revision);
    context
}

/// Text safe to place inside a `#` comment line
fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_location_template_reads_back() {
        let generator = TemplateGenerator::new().unwrap();
        let mut loc = Location::new(
            "Shelf: top".to_string(),
            Some("LOC-01HC2JB7SMQX7RS1Y0GFKBHPTD".to_string()),
            "Pat \"PJ\" Doe".to_string(),
        );
        loc.sort_order = Some(-2);
        loc.tags = vec!["cold".into()];

        let yaml = generator.render_location(&loc).unwrap();
        let parsed: Location = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, loc.id);
        assert_eq!(parsed.name, "Shelf: top");
        assert_eq!(parsed.parent, loc.parent);
        assert_eq!(parsed.sort_order, Some(-2));
        assert_eq!(parsed.tags, loc.tags);
        assert_eq!(parsed.author, loc.author);
        assert_eq!(parsed.created, loc.created);
    }

    #[test]
    fn test_minimal_location_template_is_root() {
        let generator = TemplateGenerator::new().unwrap();
        let loc = Location::new("House".to_string(), None, "t".to_string());

        let yaml = generator.render_location(&loc).unwrap();
        assert!(yaml.contains("# parent:"));

        let parsed: Location = serde_yml::from_str(&yaml).unwrap();
        assert!(parsed.is_root());
        assert_eq!(parsed.sort_order, None);
    }

    #[test]
    fn test_item_template_reads_back() {
        let generator = TemplateGenerator::new().unwrap();
        let mut item = Item::new(
            "Cordless drill".to_string(),
            Some("LOC-01HC2JB7SMQX7RS1Y0GFKBHPTD".to_string()),
            "t".to_string(),
        );
        item.category = Some("tools".into());
        item.serial_number = Some("SN-42".into());
        item.notes = Some("two batteries\nin the case".into());
        item.value = Some(129.99);
        item.purchase_date = NaiveDate::from_ymd_opt(2024, 2, 29);
        item.warranty_expires = NaiveDate::from_ymd_opt(2027, 2, 28);
        item.useful_life_years = Some(6.0);
        item.photos = vec!["photos/drill.jpg".into()];
        item.metadata.insert("color".into(), "teal".into());

        let yaml = generator.render_item(&item).unwrap();
        let parsed: Item = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, item.id);
        assert_eq!(parsed.location, item.location);
        assert_eq!(parsed.category.as_deref(), Some("tools"));
        assert_eq!(parsed.brand, None);
        assert_eq!(parsed.notes, item.notes);
        assert_eq!(parsed.value, Some(129.99));
        assert_eq!(parsed.purchase_date, item.purchase_date);
        assert_eq!(parsed.warranty_expires, item.warranty_expires);
        assert_eq!(parsed.useful_life_years, Some(6.0));
        assert_eq!(parsed.photos, item.photos);
        assert_eq!(parsed.metadata.get("color").map(String::as_str), Some("teal"));
    }

    #[test]
    fn test_minimal_item_template_is_unassigned() {
        let generator = TemplateGenerator::new().unwrap();
        let item = Item::new("Spoon".to_string(), None, "t".to_string());

        let yaml = generator.render_item(&item).unwrap();
        let parsed: Item = serde_yml::from_str(&yaml).unwrap();

        assert!(parsed.is_unassigned());
        assert_eq!(parsed.value, None);
        assert!(parsed.photos.is_empty());
    }
}

//! Item entity type - something owned and stored at a location

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::{default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::location::blank_as_none;

/// An inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Location ID; absent when the item is unassigned
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,

    /// Free-form category (e.g. "electronics"), also used for depreciation defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Purchase value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Current value set by hand; overrides the computed depreciation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciated_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,

    /// Straight-line depreciation life in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useful_life_years: Option<f64>,

    /// Value at the end of the useful life
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_expires: Option<NaiveDate>,

    /// Photo paths or URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Arbitrary extra fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who recorded this item)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Item {
    const PREFIX: EntityPrefix = EntityPrefix::Item;

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

impl Item {
    /// Create a new item
    pub fn new(name: String, location: Option<String>, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Item),
            name,
            location,
            category: None,
            brand: None,
            model: None,
            serial_number: None,
            value: None,
            depreciated_value: None,
            purchase_date: None,
            useful_life_years: None,
            salvage_value: None,
            warranty_expires: None,
            photos: Vec::new(),
            notes: None,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Purchase value for aggregation; missing or non-finite values count as zero
    pub fn value_or_zero(&self) -> f64 {
        self.value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Salvage value, clamped into `[0, value]`
    pub fn salvage_or_zero(&self) -> f64 {
        let value = self.value_or_zero();
        self.salvage_value
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, value.max(0.0))
    }

    /// Location ID as a string slice
    pub fn location_id(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_unassigned(&self) -> bool {
        self.location.is_none()
    }

    /// Case-insensitive match against name, brand, model, serial, category and tags
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let fields = [
            Some(self.name.as_str()),
            self.brand.as_deref(),
            self.model.as_deref(),
            self.serial_number.as_deref(),
            self.category.as_deref(),
            self.notes.as_deref(),
        ];

        fields
            .into_iter()
            .flatten()
            .chain(self.tags.iter().map(String::as_str))
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::new("Laptop".to_string(), None, "test".to_string())
    }

    #[test]
    fn test_item_creation() {
        let item = item();
        assert!(item.id.to_string().starts_with("ITEM-"));
        assert!(item.is_unassigned());
        assert!(item.photos.is_empty());
        assert_eq!(Item::PREFIX, EntityPrefix::Item);
    }

    #[test]
    fn test_missing_value_counts_as_zero() {
        let mut item = item();
        assert_eq!(item.value_or_zero(), 0.0);

        item.value = Some(f64::NAN);
        assert_eq!(item.value_or_zero(), 0.0);

        item.value = Some(1200.0);
        assert_eq!(item.value_or_zero(), 1200.0);
    }

    #[test]
    fn test_salvage_is_clamped_to_value() {
        let mut item = item();
        item.value = Some(100.0);
        item.salvage_value = Some(250.0);
        assert_eq!(item.salvage_or_zero(), 100.0);

        item.salvage_value = Some(-5.0);
        assert_eq!(item.salvage_or_zero(), 0.0);
    }

    #[test]
    fn test_minimal_yaml_defaults() {
        let yaml = "id: ITEM-01HQ3K4N5M6P7R8S9T0VWXYZAB\nname: Rake\nlocation: null\ncreated: 2024-01-01T00:00:00Z\nauthor: t\n";
        let item: Item = serde_yml::from_str(yaml).unwrap();

        assert!(item.is_unassigned());
        assert!(item.photos.is_empty());
        assert_eq!(item.entity_revision, 1);
        assert_eq!(item.value_or_zero(), 0.0);
    }

    #[test]
    fn test_roundtrip_keeps_dates() {
        let mut item = item();
        item.purchase_date = NaiveDate::from_ymd_opt(2023, 3, 14);
        item.warranty_expires = NaiveDate::from_ymd_opt(2026, 3, 14);
        item.location = Some("LOC-01HQ3K4N5M6P7R8S9T0VWXYZAB".to_string());

        let yaml = serde_yml::to_string(&item).unwrap();

        let parsed: Item = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.purchase_date, item.purchase_date);
        assert_eq!(parsed.location_id(), item.location_id());
    }

    #[test]
    fn test_matches_searches_several_fields() {
        let mut item = item();
        item.brand = Some("Lenovo".to_string());
        item.tags = vec!["work".to_string()];

        assert!(item.matches("LENOVO"));
        assert!(item.matches("lap"));
        assert!(item.matches("work"));
        assert!(!item.matches("desk"));
    }
}

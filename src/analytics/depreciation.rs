//! Straight-line depreciation

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::config::{Config, DEFAULT_USEFUL_LIFE_YEARS};
use crate::entities::Item;

const DAYS_PER_YEAR: f64 = 365.25;

/// Where useful-life figures come from when an item does not carry its own
#[derive(Debug, Clone)]
pub struct DepreciationPolicy {
    pub default_life_years: f64,
    /// Lower-cased category -> life in years
    pub category_life_years: BTreeMap<String, f64>,
}

impl Default for DepreciationPolicy {
    fn default() -> Self {
        Self {
            default_life_years: DEFAULT_USEFUL_LIFE_YEARS,
            category_life_years: BTreeMap::new(),
        }
    }
}

impl DepreciationPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_life_years: config.default_useful_life_years(),
            category_life_years: config
                .category_life_years
                .iter()
                .filter(|(_, years)| **years > 0.0)
                .map(|(name, years)| (name.trim().to_lowercase(), *years))
                .collect(),
        }
    }

    /// Useful life: the item's own, then its category's, then the default
    pub fn life_for(&self, item: &Item) -> f64 {
        item.useful_life_years
            .filter(|years| years.is_finite() && *years > 0.0)
            .or_else(|| {
                item.category
                    .as_deref()
                    .and_then(|c| self.category_life_years.get(&c.trim().to_lowercase()))
                    .copied()
            })
            .unwrap_or(self.default_life_years)
    }

    /// Current value of an item on `as_of`
    ///
    /// An explicit `depreciated_value` on the record always wins. Without a
    /// purchase date nothing has depreciated yet.
    pub fn current_value(&self, item: &Item, as_of: NaiveDate) -> f64 {
        if let Some(explicit) = item.depreciated_value.filter(|v| v.is_finite()) {
            return explicit;
        }

        let value = item.value_or_zero();
        let Some(purchased) = item.purchase_date else {
            return value;
        };

        let age_years = (as_of - purchased).num_days() as f64 / DAYS_PER_YEAR;
        straight_line(value, item.salvage_or_zero(), self.life_for(item), age_years)
    }
}

/// `value - (value - salvage) * min(age / life, 1)`, clamped to `[salvage, value]`
pub fn straight_line(value: f64, salvage: f64, life_years: f64, age_years: f64) -> f64 {
    if value <= 0.0 || life_years <= 0.0 {
        return value;
    }

    let salvage = salvage.clamp(0.0, value);
    let fraction = (age_years / life_years).clamp(0.0, 1.0);
    (value - (value - salvage) * fraction).clamp(salvage, value)
}

//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::Project;

/// Fallback straight-line depreciation life
pub const DEFAULT_USEFUL_LIFE_YEARS: f64 = 5.0;

/// Fallback warranty warning window
pub const DEFAULT_WARRANTY_WARNING_DAYS: i64 = 30;

/// Inventory configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new records
    pub author: Option<String>,

    /// Editor command for `pinv ... edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Currency symbol shown next to values
    pub currency: Option<String>,

    /// Days before expiry at which a warranty is flagged
    pub warranty_warning_days: Option<i64>,

    /// Useful life used when neither the item nor its category sets one
    pub default_useful_life_years: Option<f64>,

    /// Useful life per item category (matched case-insensitively)
    pub category_life_years: BTreeMap<String, f64>,
}

/// Every recognised key with a short description
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("author", "Default author for new records"),
    ("editor", "Editor command for `pinv loc edit` / `pinv item edit`"),
    ("default_format", "Default output format (yaml, json, tsv, ...)"),
    ("currency", "Currency symbol used in reports"),
    ("warranty_warning_days", "Days before expiry that count as expiring soon"),
    ("default_useful_life_years", "Depreciation life when none is set"),
    ("category_life_years.<category>", "Depreciation life for one category"),
];

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/pinv/config.yaml)
        if let Some(global) = Self::global_config_path().and_then(|p| Self::read_file(&p)) {
            config.merge(global);
        }

        // 3. Project config (.pinv/config.yaml)
        if let Some(project) = project {
            if let Some(local) = Self::read_file(&Self::project_config_path(project)) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("PINV_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("PINV_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable config");
                None
            }
        }
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pinv")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path to a project's config file
    pub fn project_config_path(project: &Project) -> PathBuf {
        project.pinv_dir().join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }
        if other.warranty_warning_days.is_some() {
            self.warranty_warning_days = other.warranty_warning_days;
        }
        if other.default_useful_life_years.is_some() {
            self.default_useful_life_years = other.default_useful_life_years;
        }
        self.category_life_years.extend(other.category_life_years);
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let mut parts = editor.split_whitespace();

        let Some(cmd) = parts.next() else {
            return std::process::Command::new("vi").arg(file_path).status();
        };

        std::process::Command::new(cmd)
            .args(parts)
            .arg(file_path)
            .status()
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("$")
    }

    pub fn warranty_warning_days(&self) -> i64 {
        self.warranty_warning_days
            .unwrap_or(DEFAULT_WARRANTY_WARNING_DAYS)
    }

    pub fn default_useful_life_years(&self) -> f64 {
        self.default_useful_life_years
            .filter(|years| *years > 0.0)
            .unwrap_or(DEFAULT_USEFUL_LIFE_YEARS)
    }

    /// Configured life for a category, if any
    pub fn category_life(&self, category: &str) -> Option<f64> {
        let wanted = category.trim().to_lowercase();
        self.category_life_years
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, years)| *years)
            .filter(|years| *years > 0.0)
    }

    /// Render a single key's effective value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "author" => self.author.clone(),
            "editor" => self.editor.clone(),
            "default_format" => self.default_format.clone(),
            "currency" => self.currency.clone(),
            "warranty_warning_days" => self.warranty_warning_days.map(|d| d.to_string()),
            "default_useful_life_years" => self.default_useful_life_years.map(|y| y.to_string()),
            _ => key
                .strip_prefix("category_life_years.")
                .and_then(|category| self.category_life(category))
                .map(|y| y.to_string()),
        }
    }

    /// Whether `key` is one of the recognised keys
    pub fn is_known_key(key: &str) -> bool {
        CONFIG_KEYS.iter().any(|(k, _)| *k == key)
            || key
                .strip_prefix("category_life_years.")
                .is_some_and(|category| !category.is_empty())
    }
}

/// Set a dotted key (e.g. `category_life_years.tools`) in a YAML document
///
/// Values that parse as YAML scalars keep their type, so `30` is stored as a
/// number and `"30"` as a string.
pub fn set_value(root: &mut serde_yml::Value, key: &str, value: &str) {
    if !root.is_mapping() {
        *root = serde_yml::Value::Mapping(Default::default());
    }

    let parsed = match serde_yml::from_str::<serde_yml::Value>(value) {
        Ok(v @ (serde_yml::Value::Number(_) | serde_yml::Value::Bool(_))) => v,
        _ => serde_yml::Value::String(value.to_string()),
    };

    let parts: Vec<&str> = key.split('.').collect();
    let (last, path) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = root;
    for part in path {
        let serde_yml::Value::Mapping(map) = current else {
            return;
        };
        let key = serde_yml::Value::String(part.to_string());
        let entry = map
            .entry(key)
            .or_insert_with(|| serde_yml::Value::Mapping(Default::default()));
        if !entry.is_mapping() {
            *entry = serde_yml::Value::Mapping(Default::default());
        }
        current = entry;
    }

    if let serde_yml::Value::Mapping(map) = current {
        map.insert(serde_yml::Value::String(last.to_string()), parsed);
    }
}

/// Remove a dotted key; returns whether anything was removed
pub fn unset_value(root: &mut serde_yml::Value, key: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, path)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for part in path {
        match current.get_mut(*part) {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(last.to_string()))
            .is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            author: Some("global".into()),
            currency: Some("€".into()),
            ..Default::default()
        };
        base.category_life_years.insert("tools".into(), 8.0);

        let mut project = Config {
            author: Some("project".into()),
            ..Default::default()
        };
        project.category_life_years.insert("electronics".into(), 4.0);

        base.merge(project);
        assert_eq!(base.author.as_deref(), Some("project"));
        assert_eq!(base.currency(), "€");
        assert_eq!(base.category_life("Tools"), Some(8.0));
        assert_eq!(base.category_life("electronics"), Some(4.0));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.currency(), "$");
        assert_eq!(config.warranty_warning_days(), 30);
        assert_eq!(config.default_useful_life_years(), 5.0);
        assert_eq!(config.category_life("anything"), None);
    }

    #[test]
    fn test_non_positive_life_is_ignored() {
        let mut config = Config {
            default_useful_life_years: Some(0.0),
            ..Default::default()
        };
        config.category_life_years.insert("toys".into(), -1.0);
        assert_eq!(config.default_useful_life_years(), 5.0);
        assert_eq!(config.category_life("toys"), None);
    }

    #[test]
    fn test_set_and_unset_nested_value() {
        let mut doc = serde_yml::Value::Null;
        set_value(&mut doc, "warranty_warning_days", "45");
        set_value(&mut doc, "category_life_years.furniture", "10");
        set_value(&mut doc, "author", "Sam");

        let config: Config = serde_yml::from_value(doc.clone()).unwrap();
        assert_eq!(config.warranty_warning_days, Some(45));
        assert_eq!(config.category_life("furniture"), Some(10.0));
        assert_eq!(config.author.as_deref(), Some("Sam"));

        assert!(unset_value(&mut doc, "category_life_years.furniture"));
        assert!(!unset_value(&mut doc, "category_life_years.furniture"));
        assert!(!unset_value(&mut doc, "missing.key"));
    }

    #[test]
    fn test_known_keys() {
        assert!(Config::is_known_key("currency"));
        assert!(Config::is_known_key("category_life_years.tools"));
        assert!(!Config::is_known_key("category_life_years."));
        assert!(!Config::is_known_key("pager"));
    }
}

//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Name of the marker directory at the project root
pub const MARKER_DIR: &str = ".pinv";

/// Suffix shared by every record file
pub const RECORD_SUFFIX: &str = ".pinv.yaml";

/// Represents an inventory project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .pinv/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                tracing::debug!(root = %current.display(), "found project");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open a project at exactly this path (no walking up)
    pub fn at(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .map_err(|e| ProjectError::IoError(format!("{}: {}", path.display(), e)))?;

        if !root.join(MARKER_DIR).is_dir() {
            return Err(ProjectError::NotFound {
                searched_from: path.to_path_buf(),
            });
        }

        Ok(Self { root })
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(MARKER_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    /// Initialize even if .pinv/ exists; the config file is rewritten
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    fn create_structure(root: &Path) -> Result<(), ProjectError> {
        let marker = root.join(MARKER_DIR);
        std::fs::create_dir_all(&marker).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(marker.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(prefix.directory()))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    fn default_config() -> &'static str {
        r#"# Inventory project configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Editor to use for `pinv ... edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Currency symbol used in reports
# currency: "$"

# Days before expiry at which a warranty counts as "expiring soon"
# warranty_warning_days: 30

# Straight-line depreciation life when neither the item nor its category sets one
# default_useful_life_years: 5

# Per-category useful life in years
# category_life_years:
#   electronics: 4
#   furniture: 10
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .pinv configuration directory
    pub fn pinv_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    /// Directory holding records of the given type
    pub fn record_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.directory())
    }

    /// Get the path for a record file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.record_dir(id.prefix())
            .join(format!("{}{}", id, RECORD_SUFFIX))
    }

    /// Iterate all record files of a given type, sorted by file name
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        walkdir::WalkDir::new(self.record_dir(prefix))
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }

    /// Path relative to the project root, for display
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an inventory project (searched from {searched_from:?}). Run 'pinv init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("inventory project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.pinv_dir().is_dir());
        assert!(project.pinv_dir().join("config.yaml").exists());
        assert!(project.root().join("locations").is_dir());
        assert!(project.root().join("items").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));

        // --force path succeeds
        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_walks_up() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("locations/nested");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(project.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_project_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_project_at_does_not_walk_up() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        let subdir = tmp.path().join("items");

        assert!(Project::at(tmp.path()).is_ok());
        assert!(matches!(
            Project::at(&subdir).unwrap_err(),
            ProjectError::NotFound { .. }
        ));
    }

    #[test]
    fn test_entity_path_uses_type_directory() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Item);

        let path = project.entity_path(&id);
        assert!(path.starts_with(project.root().join("items")));
        assert!(path.to_string_lossy().ends_with(".pinv.yaml"));
    }
}

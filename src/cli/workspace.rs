//! The project, configuration and store a command works against
//!
//! Built once in `main` and lent to every project-bound command.

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::{Config, InventoryStore, Project, ShortIdIndex, Snapshot, YamlStore};

pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub store: Box<dyn InventoryStore>,
}

impl Workspace {
    /// Open the project named by `--project`, or the one containing the
    /// current directory
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match &global.project {
            Some(path) => Project::at(path),
            None => Project::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = Config::load(Some(&project));
        let store = YamlStore::new(project.clone()).map_err(|e| miette::miette!("{}", e))?;
        tracing::debug!(root = %project.root().display(), "opened project");

        Ok(Self {
            project,
            config,
            store: Box::new(store),
        })
    }

    /// Load every record, reporting unreadable files on stderr
    pub fn snapshot(&self, quiet: bool) -> Result<Snapshot> {
        let snapshot = self.store.snapshot().map_err(|e| miette::miette!("{}", e))?;
        if !quiet && !snapshot.issues.is_empty() {
            eprintln!(
                "{} {} record file(s) could not be read; run {} for details",
                console::style("!").yellow(),
                snapshot.issues.len(),
                console::style("pinv validate").yellow()
            );
        }
        Ok(snapshot)
    }

    pub fn short_ids(&self) -> ShortIdIndex {
        ShortIdIndex::load(&self.project)
    }

    pub fn save_short_ids(&self, short_ids: &ShortIdIndex) {
        if let Err(e) = short_ids.save(&self.project) {
            tracing::warn!(error = %e, "could not save short id index");
        }
    }
}

//! Core module - project layout, identity, configuration and storage

pub mod config;
pub mod entity;
pub mod identity;
pub mod mutation;
pub mod project;
pub mod shortid;
pub mod store;

pub use config::Config;
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use mutation::{DeleteReport, MutationError};
pub use project::{Project, ProjectError};
pub use shortid::ShortIdIndex;
pub use store::{InventoryStore, LoadIssue, RecordKind, Snapshot, StoreError, YamlStore};

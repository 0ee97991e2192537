//! pinv: plain-text property inventory
//!
//! Locations form a hierarchy (building, room, shelf, ...) and items are
//! stored at a location. Every record is a YAML file under version control;
//! item counts and values roll up through the hierarchy.

pub mod analytics;
pub mod cli;
pub mod core;
pub mod engine;
pub mod entities;
pub mod schema;
pub mod yaml;

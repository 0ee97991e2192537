//! CLI command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod import;
pub mod init;
pub mod item;
pub mod loc;
pub mod report;
pub mod search;
pub mod status;
pub mod tree;
pub mod validate;
